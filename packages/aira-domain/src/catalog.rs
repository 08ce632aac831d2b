//! Curated inventory.
//!
//! A fixed, bestseller-ordered catalog that backs the keyword and popular tiers of the matching
//! engine. It is compiled in and never mutated, so every request can read it without locking.

use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ItemKind {
	Course,
	Mentor,
}

#[derive(Debug, Clone, Serialize)]
pub struct CuratedItem {
	pub id: &'static str,
	pub title: &'static str,
	pub kind: ItemKind,
	pub category: &'static str,
	pub description: &'static str,
	/// Lower-case synonyms, substring-matched against the topic.
	pub tags: &'static [&'static str],
	pub difficulty: &'static str,
	pub duration: &'static str,
	pub rating: f32,
	pub students: u32,
	pub mentor: &'static str,
}
impl CuratedItem {
	/// Number of tags that occur in an already lower-cased topic.
	pub fn tag_hits(&self, lowered_topic: &str) -> usize {
		self.tags.iter().filter(|tag| lowered_topic.contains(*tag)).count()
	}
}

/// Ordered by sales; the popular tier takes a prefix of this list.
pub static INVENTORY: [CuratedItem; 8] = [
	CuratedItem {
		id: "bs_python_backend",
		title: "Introduction to Python Backend Development",
		kind: ItemKind::Course,
		category: "Backend Development",
		description: "Build REST APIs with Django and FastAPI, from zero to a production-ready \
		              backend.",
		tags: &[
			"python",
			"django",
			"fastapi",
			"backend",
			"back-end",
			"server",
			"api",
			"rest",
			"database",
			"sql",
			"programming",
			"proqramlaşdırma",
			"code",
			"flask",
			"postgresql",
			"mysql",
		],
		difficulty: "Beginner",
		duration: "22 hours",
		rating: 4.8,
		students: 214,
		mentor: "Elchin Mammadli",
	},
	CuratedItem {
		id: "bs_frontend_react",
		title: "Frontend Roadmap: From HTML to React",
		kind: ItemKind::Course,
		category: "Frontend Development",
		description: "The full frontend path: HTML, CSS, JavaScript and React. Become a web \
		              developer.",
		tags: &[
			"frontend",
			"front-end",
			"html",
			"css",
			"javascript",
			"react",
			"vue",
			"angular",
			"web",
			"website",
			"interface",
			"responsive",
			"tailwind",
			"bootstrap",
			"next.js",
		],
		difficulty: "Beginner",
		duration: "35 hours",
		rating: 4.8,
		students: 390,
		mentor: "Nigar Gasimova",
	},
	CuratedItem {
		id: "bs_data_science",
		title: "Python for Data Analytics",
		kind: ItemKind::Course,
		category: "Data Science",
		description: "Data analysis with Pandas, NumPy and Matplotlib. An entry point into data \
		              science.",
		tags: &[
			"data",
			"analytics",
			"analysis",
			"science",
			"python",
			"pandas",
			"numpy",
			"matplotlib",
			"machine learning",
			"artificial intelligence",
			"statistics",
			"visualization",
			"tableau",
			"power bi",
			"excel",
		],
		difficulty: "Beginner",
		duration: "20 hours",
		rating: 4.8,
		students: 310,
		mentor: "Aysel Ahmadova",
	},
	CuratedItem {
		id: "bs_cybersecurity",
		title: "Cybersecurity Fundamentals",
		kind: ItemKind::Course,
		category: "Cybersecurity",
		description: "Network security, penetration testing and ethical hacking fundamentals.",
		tags: &[
			"security",
			"cyber",
			"hacking",
			"hacker",
			"pentest",
			"penetration",
			"network",
			"firewall",
			"malware",
			"ethical",
			"kali",
			"linux",
			"ctf",
		],
		difficulty: "Intermediate",
		duration: "25 hours",
		rating: 4.7,
		students: 156,
		mentor: "Murad Aliyev",
	},
	CuratedItem {
		id: "bs_uiux_design",
		title: "UI/UX Design Masterclass",
		kind: ItemKind::Course,
		category: "UI/UX Design",
		description: "Professional interface design with Figma, plus UX research methods.",
		tags: &[
			"design",
			"dizayn",
			"figma",
			"ui/ux",
			"user experience",
			"user interface",
			"photoshop",
			"adobe",
			"illustrator",
			"sketch",
			"prototyping",
			"wireframe",
			"mockup",
			"graphic",
			"creative",
		],
		difficulty: "Beginner",
		duration: "18 hours",
		rating: 4.9,
		students: 245,
		mentor: "Laman Huseynova",
	},
	CuratedItem {
		id: "bs_devops",
		title: "DevOps and Cloud Engineering",
		kind: ItemKind::Course,
		category: "DevOps",
		description: "Docker, Kubernetes, AWS and CI/CD. Infrastructure as code.",
		tags: &[
			"devops",
			"docker",
			"kubernetes",
			"k8s",
			"aws",
			"cloud",
			"azure",
			"gcp",
			"ci/cd",
			"jenkins",
			"gitlab",
			"linux",
			"terraform",
			"ansible",
			"infrastructure",
			"deployment",
			"automation",
		],
		difficulty: "Intermediate",
		duration: "30 hours",
		rating: 4.7,
		students: 128,
		mentor: "Tural Mammadov",
	},
	CuratedItem {
		id: "bs_mobile_flutter",
		title: "Mobile App Development with Flutter",
		kind: ItemKind::Course,
		category: "Mobile Development",
		description: "Cross-platform mobile development: one codebase for iOS and Android.",
		tags: &[
			"mobile",
			"mobil",
			"flutter",
			"dart",
			"android",
			"ios",
			"react native",
			"swift",
			"kotlin",
			"cross-platform",
			"phone",
			"application",
		],
		difficulty: "Beginner",
		duration: "28 hours",
		rating: 4.8,
		students: 189,
		mentor: "Orkhan Rahimli",
	},
	CuratedItem {
		id: "bs_sql_database",
		title: "SQL and Database Management",
		kind: ItemKind::Course,
		category: "Database",
		description: "Database design and query optimization with PostgreSQL and MySQL.",
		tags: &[
			"sql",
			"database",
			"postgresql",
			"mysql",
			"mongodb",
			"nosql",
			"query",
			"data",
			"oracle",
			"sqlite",
			"normalization",
			"index",
			"optimization",
		],
		difficulty: "Beginner",
		duration: "15 hours",
		rating: 4.6,
		students: 276,
		mentor: "Farid Huseynov",
	},
];

pub fn inventory() -> &'static [CuratedItem] {
	&INVENTORY
}

/// Items with at least one tag hit, most hits first, ties in inventory order.
pub fn keyword_matches(lowered_topic: &str, top_k: usize) -> Vec<(&'static CuratedItem, usize)> {
	let mut matches: Vec<(&'static CuratedItem, usize)> = INVENTORY
		.iter()
		.map(|item| (item, item.tag_hits(lowered_topic)))
		.filter(|(_, hits)| *hits > 0)
		.collect();

	// Stable sort keeps the bestseller order between equal counts.
	matches.sort_by(|left, right| right.1.cmp(&left.1));
	matches.truncate(top_k);

	matches
}

/// The first `count` bestsellers, at least one.
pub fn bestsellers(count: usize) -> &'static [CuratedItem] {
	&INVENTORY[..count.clamp(1, INVENTORY.len())]
}
