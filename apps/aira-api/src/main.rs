use clap::Parser;

#[tokio::main]
async fn main() -> color_eyre::Result<()> {
	color_eyre::install()?;

	let args = aira_api::Args::parse();

	aira_api::run(args).await
}
