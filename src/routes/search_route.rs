use actix_web::{get, post, web, HttpResponse};
use serde::Deserialize;
use serde_json::json;

use crate::{
    dal::establishment_db::PgStore,
    domain::search::{MergeMode, SearchRequest, Source, DEFAULT_MAX_RESULTS},
    error::MonitorError,
    services::{reconciler::pending_confirmation, run_search, Monitor},
};

fn default_max_results() -> usize {
    DEFAULT_MAX_RESULTS
}

#[derive(Deserialize)]
struct SearchBody {
    #[serde(default)]
    establishment_type: String,
    #[serde(default)]
    region: String,
    #[serde(default = "default_max_results")]
    max_results: usize,
    #[serde(default)]
    source: Source,
    #[serde(default)]
    mode: MergeMode,
}

fn error_body(message: &str) -> serde_json::Value {
    json!({ "status": "error", "error": message })
}

#[post("/search")]
async fn start_search(
    body: web::Json<SearchBody>,
    monitor: web::Data<Monitor>,
    store: web::Data<PgStore>,
) -> HttpResponse {
    let body = body.into_inner();
    let establishment_type = body.establishment_type.trim();
    let region = body.region.trim();
    if establishment_type.is_empty() || region.is_empty() {
        return HttpResponse::BadRequest()
            .json(error_body("Tipo de estabelecimento e região são obrigatórios"));
    }
    if body.max_results == 0 {
        return HttpResponse::BadRequest().json(error_body("max_results deve ser maior que zero"));
    }

    let request = SearchRequest {
        establishment_type: establishment_type.to_string(),
        region: region.to_string(),
        max_results: body.max_results,
        source: body.source,
        mode: body.mode,
    };

    if monitor.is_running() {
        return HttpResponse::Conflict().json(error_body("Já existe uma coleta em andamento"));
    }

    match pending_confirmation(store.get_ref(), &request).await {
        Ok(Some(existing_count)) => {
            return HttpResponse::Ok().json(json!({
                "status": "confirm",
                "message": format!(
                    "Já existem {} resultados para \"{}\". Deseja sobrescrever ou juntar?",
                    existing_count,
                    request.query()
                ),
                "options": ["overwrite", "merge"],
                "existing_count": existing_count,
            }))
        }
        Ok(None) => {}
        Err(e) => {
            log::error!("Error looking up stored results: {:?}", e);
            return HttpResponse::InternalServerError()
                .json(error_body("Erro ao consultar resultados salvos"));
        }
    }

    if let Err(MonitorError::AlreadyRunning) = monitor.try_begin() {
        return HttpResponse::Conflict().json(error_body("Já existe uma coleta em andamento"));
    }

    log::info!("Starting search \"{}\" ({:?})", request.query(), request.mode);
    let monitor = monitor.into_inner();
    let store = store.into_inner();
    tokio::spawn(async move { run_search(&monitor, store.as_ref(), request).await });

    HttpResponse::Accepted().json(json!({ "status": "running" }))
}

#[get("/status")]
async fn status(monitor: web::Data<Monitor>) -> HttpResponse {
    HttpResponse::Ok().json(monitor.snapshot())
}

#[get("/results")]
async fn results(monitor: web::Data<Monitor>) -> HttpResponse {
    HttpResponse::Ok().json(monitor.results())
}

#[get("/sources")]
async fn sources() -> HttpResponse {
    let sources: Vec<_> = Source::ALL
        .iter()
        .map(|s| {
            json!({
                "id": s.id(),
                "name": s.name(),
                "description": s.description(),
            })
        })
        .collect();

    HttpResponse::Ok().json(sources)
}

#[cfg(test)]
mod tests {
    use actix_web::{http::StatusCode, test, web, App};
    use serde_json::json;
    use sqlx::postgres::{PgConnectOptions, PgPoolOptions};

    use crate::{dal::establishment_db::PgStore, services::Monitor};

    fn state() -> (web::Data<Monitor>, web::Data<PgStore>) {
        let pool = PgPoolOptions::new().connect_lazy_with(PgConnectOptions::new());
        (
            web::Data::new(Monitor::new("collector".into(), "resultados.txt".into())),
            web::Data::new(PgStore::new(pool)),
        )
    }

    #[actix_web::test]
    async fn search_requires_type_and_region() {
        let (monitor, store) = state();
        let app = test::init_service(
            App::new()
                .app_data(monitor)
                .app_data(store)
                .service(web::scope("/api").service(super::start_search)),
        )
        .await;

        let req = test::TestRequest::post()
            .uri("/api/search")
            .set_json(json!({ "establishment_type": "  ", "region": "Campo Grande" }))
            .to_request();
        let resp = test::call_service(&app, req).await;

        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    }

    #[actix_web::test]
    async fn search_rejects_directory_sources() {
        let (monitor, store) = state();
        let app = test::init_service(
            App::new()
                .app_data(monitor.clone())
                .app_data(store)
                .service(web::scope("/api").service(super::start_search)),
        )
        .await;

        for source in ["paginas_amarelas", "apontador"] {
            let req = test::TestRequest::post()
                .uri("/api/search")
                .set_json(json!({
                    "establishment_type": "padarias",
                    "region": "Campo Grande",
                    "source": source,
                }))
                .to_request();
            let resp = test::call_service(&app, req).await;

            assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        }
        assert!(!monitor.is_running());
    }

    #[actix_web::test]
    async fn search_is_rejected_while_running() {
        let (monitor, store) = state();
        monitor.try_begin().unwrap();
        let app = test::init_service(
            App::new()
                .app_data(monitor)
                .app_data(store)
                .service(web::scope("/api").service(super::start_search)),
        )
        .await;

        let req = test::TestRequest::post()
            .uri("/api/search")
            .set_json(json!({ "establishment_type": "padarias", "region": "Campo Grande" }))
            .to_request();
        let resp = test::call_service(&app, req).await;

        assert_eq!(resp.status(), StatusCode::CONFLICT);
    }

    #[actix_web::test]
    async fn status_reports_snapshot() {
        let (monitor, _) = state();
        monitor.try_begin().unwrap();
        let app = test::init_service(
            App::new()
                .app_data(monitor)
                .service(web::scope("/api").service(super::status)),
        )
        .await;

        let req = test::TestRequest::get().uri("/api/status").to_request();
        let body: serde_json::Value = test::call_and_read_body_json(&app, req).await;

        assert_eq!(body["is_running"], true);
        assert_eq!(body["progress"], 10);
        assert_eq!(body["phase"], "starting");
    }

    #[actix_web::test]
    async fn sources_lists_google_maps() {
        let app =
            test::init_service(App::new().service(web::scope("/api").service(super::sources)))
                .await;

        let req = test::TestRequest::get().uri("/api/sources").to_request();
        let body: serde_json::Value = test::call_and_read_body_json(&app, req).await;

        assert_eq!(body[0]["id"], "google_maps");
    }
}
