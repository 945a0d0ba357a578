//! `get-real-id`: resolve 7gogo public page ids to API `talkId`s.
//!
//! A talk's public page id is not the id the API uses. Furuhata Nao's page,
//! for example, is `http://7gogo.jp/lp/Xe8jJ0D40_aWkVIvojdMdG==`, but her
//! `talkId` is `MqsG1FLTi-_9GtN76wEuUm==`.
//!
//! ```sh
//! $ get-real-id http://7gogo.jp/lp/Xe8jJ0D40_aWkVIvojdMdG== 9YFoGjThCxeWkVIvojdMdG==
//! http://7gogo.jp/lp/Xe8jJ0D40_aWkVIvojdMdG== : MqsG1FLTi-_9GtN76wEuUm==
//! http://7gogo.jp/lp/9YFoGjThCxeWkVIvojdMdG== : Kx09K9lOsMF9GtN76wEuUm==
//! ```
//!
//! Set `RUST_LOG=nanagogo=debug` to see each request on stderr.

use std::io::{self, Write};
use std::process;

use clap::Parser;
use nanagogo::{ApiClient, ClientConfig, PageResolver, TalkIdResolver, Transport};
use tracing::debug;

/// get-real-id: resolve 7gogo public page ids to API talkIds
///
/// Each argument is either a full page URL or a bare public id, which is
/// expanded against the page URL template. Prints `URL : talkId` per
/// argument, in order.
#[derive(Parser)]
#[command(name = "get-real-id", version, about, long_about = None)]
struct Cli {
    /// Page URLs (http…) or bare public ids.
    #[arg(required = true, value_name = "ID_OR_URL")]
    ids: Vec<String>,

    /// Template for bare ids; `{}` is replaced by the id.
    #[arg(long, env = "NANAGOGO_PAGE_URL", value_name = "TEMPLATE")]
    page_url: Option<String>,
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "nanagogo=warn".into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let mut config = ClientConfig::from_env();
    if let Some(template) = cli.page_url {
        if !template.contains("{}") {
            fatal(&format!("--page-url {template:?} has no {{}} placeholder"));
        }
        config.page_url = template;
    }

    debug!(page_url = %config.page_url, timeout = ?config.timeout, "client config");
    let client = ApiClient::with_config(config)
        .unwrap_or_else(|e| fatal(&format!("failed to build HTTP client: {e}")));

    let stdout = io::stdout();
    if let Err(msg) = run(&client.resolver(), &cli.ids, &mut stdout.lock()) {
        fatal(&msg);
    }
}

/// Resolve each of `ids` in order, writing `URL : talkId` lines to `out`.
///
/// Stops at the first id that fails to resolve; lines already written stay.
fn run<T: Transport>(
    resolver: &PageResolver<'_, T>,
    ids: &[String],
    out: &mut impl Write,
) -> Result<(), String> {
    for id in ids {
        let url = resolver.page_url(id);
        let talk_id = resolver.resolve(&url).map_err(|e| format!("{url}: {e}"))?;
        writeln!(out, "{url} : {talk_id}").map_err(|e| format!("write failed: {e}"))?;
    }
    Ok(())
}

/// Print an error message to stderr and exit with code 2.
fn fatal(msg: &str) -> ! {
    eprintln!("get-real-id: {msg}");
    process::exit(2);
}
