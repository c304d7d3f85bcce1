use std::process::ExitCode;

use bedrock_access::{client, logging, ClientArgs, ClientSettings, ModelQuery};
use clap::Parser;

/// Lists Bedrock foundation models
///
/// Prints the model id, provider and name of every model offered in the
/// region, in the order the service returns them.  Callers need permission
/// for `bedrock:ListFoundationModels`; run `apply-permissions` if the call is
/// denied.
///
///     https://docs.aws.amazon.com/bedrock/latest/userguide/models-supported.html
#[derive(Parser, Debug, Clone)]
#[clap(author, version, about, verbatim_doc_comment)]
struct CliArgs {
    #[clap(flatten)]
    client: ClientArgs,

    /// Optional case-insensitive provider filter, e.g. Amazon, amazon, Anthropic.
    #[clap(long)]
    provider: Option<String>,
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = CliArgs::parse();
    logging::init(cli.client.verbose);

    let settings = ClientSettings::from(cli.client);
    let query = ModelQuery {
        provider: cli.provider,
    };

    match run(&settings, &query).await {
        Ok(()) => ExitCode::SUCCESS,
        // e.g. `list-models | head`
        Err(err) if err.is_broken_pipe() => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("error: {}", err);
            eprintln!("hint: {}", err.hint());
            ExitCode::FAILURE
        }
    }
}

async fn run(settings: &ClientSettings, query: &ModelQuery) -> bedrock_access::Result<()> {
    let config = client::load_config(settings).await?;
    let cpclient = client::new_controlplane_client(&config);

    let stdout = std::io::stdout();
    let mut out = stdout.lock();
    bedrock_access::print_models(&cpclient, query, &mut out).await?;
    Ok(())
}
