use std::{net::TcpListener, path::Path};

use actix_files::Files;
use actix_web::{dev::Server, middleware::Logger, web, App, HttpServer};

use crate::{
    dal::establishment_db::PgStore,
    routes::{default_route, export_route, search_route},
    services::Monitor,
};

pub fn run(
    listener: TcpListener,
    monitor: Monitor,
    store: PgStore,
    static_dir: &Path,
) -> Result<Server, std::io::Error> {
    let monitor = web::Data::new(monitor);
    let store = web::Data::new(store);
    let static_dir = static_dir.to_path_buf();

    let server = HttpServer::new(move || {
        App::new()
            .wrap(Logger::default())
            .service(Files::new("/static", static_dir.clone()).prefer_utf8(true))
            .service(default_route::default)
            .service(
                web::scope("/api")
                    .service(search_route::start_search)
                    .service(search_route::status)
                    .service(search_route::results)
                    .service(search_route::sources),
            )
            .service(web::scope("/export").service(export_route::export_results))
            .app_data(monitor.clone())
            .app_data(store.clone())
    })
    .listen(listener)?
    .run();

    Ok(server)
}
