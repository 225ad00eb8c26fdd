mod err;
mod files;
mod http;
mod mime;
mod opt;
mod router;
mod routes;
mod swapi;

#[tokio::main]
async fn main() -> Result<(), err::DisplayError> {
    let opt::Options {
        verbose,
        listen,
        root,
        films_url,
    } = clap::Parser::parse();

    env_logger::Builder::new()
        .filter_level(match verbose {
            0 => log::LevelFilter::Info,
            1 => log::LevelFilter::Debug,
            _ => log::LevelFilter::Trace,
        })
        .init();

    log::info!("serving {} at http://{}/", root.display(), listen);
    log::info!("proxying film lookups to {}", films_url);

    let client = std::sync::Arc::new(swapi::FilmClient::new(films_url)?);
    let state = routes::build(client, root);

    http::run_simple_server(listen, state, routes::respond_to_request).await?;

    Ok(())
}
