use actix_web::{get, http::header, web, HttpResponse};
use serde_json::json;

use crate::services::{
    export::{self, ExportFormat},
    Monitor,
};

#[get("/{format}")]
async fn export_results(path: web::Path<String>, monitor: web::Data<Monitor>) -> HttpResponse {
    let Some(format) = ExportFormat::parse(&path.into_inner()) else {
        return HttpResponse::NotFound().json(json!({ "error": "Formato não suportado" }));
    };

    let results = monitor.results();
    if results.results.is_empty() {
        return HttpResponse::NotFound().json(json!({ "error": "Nenhum resultado para exportar" }));
    }

    let body = match export::render(format, &results) {
        Ok(body) => body,
        Err(e) => {
            log::error!("Error rendering {:?} export: {:?}", format, e);
            return HttpResponse::InternalServerError().finish();
        }
    };
    let file_name = export::file_name(format, chrono::Local::now().naive_local());

    HttpResponse::Ok()
        .content_type(format.content_type())
        .insert_header((
            header::CONTENT_DISPOSITION,
            format!("attachment; filename=\"{}\"", file_name),
        ))
        .body(body)
}
