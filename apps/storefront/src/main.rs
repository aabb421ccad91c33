use anyhow::Context;
use fhub_kernel::config::load_config;
use fhub_logger::Logger;
use fhub_storefront::Storefront;

#[fhub_runtime::main(high_performance)]
async fn main() -> anyhow::Result<()> {
    let _log = Logger::builder().name(env!("CARGO_PKG_NAME")).init()?;

    let cfg = load_config(Some("storefront")).context("Critical: Configuration is malformed")?;

    Storefront::builder().config(cfg).build()?.run().await
}
