use actix_web::{HttpRequest, HttpResponse, Responder, web};
use tracing::{debug, trace};

use crate::config::get_config;
use crate::services::LocationService;
use crate::utils::ip::extract_client_ip;

pub struct LocationHandler;

impl LocationHandler {
    /// 解析调用方地址
    pub async fn locate_caller(
        req: HttpRequest,
        service: web::Data<LocationService>,
    ) -> impl Responder {
        let config = get_config();
        let client_ip = extract_client_ip(&req, &config.server.trusted_proxies).unwrap_or_default();
        debug!("Locating caller {}", client_ip);

        let report = service.locate(&client_ip).await;
        HttpResponse::Ok().json(report)
    }

    /// 解析路径中的地址
    pub async fn locate_address(
        path: web::Path<String>,
        service: web::Data<LocationService>,
    ) -> impl Responder {
        let ip = path.into_inner();
        trace!("Explicit lookup for {}", ip);

        let report = service.locate(&ip).await;
        HttpResponse::Ok().json(report)
    }
}

pub fn location_routes(cfg: &mut web::ServiceConfig) {
    cfg.route("/", web::get().to(LocationHandler::locate_caller))
        .route("/lookup/{ip}", web::get().to(LocationHandler::locate_address));
}
