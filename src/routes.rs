use crate::{
    api::{employee, export, payroll, rating, salary, team_incentive},
    auth::middleware::auth_middleware,
    config::Config,
};
use actix_governor::{
    Governor, GovernorConfigBuilder, PeerIpKeyExtractor, governor::middleware::NoOpMiddleware,
};
use actix_web::{HttpResponse, Responder, get, middleware::from_fn, web};
use std::sync::Arc;

/// Liveness check, outside the auth scope.
#[get("/health")]
pub async fn health() -> impl Responder {
    HttpResponse::Ok().json(serde_json::json!({ "status": "ok" }))
}

pub type Limiter = Governor<PeerIpKeyExtractor, NoOpMiddleware>;

/// Per-IP limiter allowing `requests_per_min` with an equal burst.
pub fn build_limiter(requests_per_min: u32) -> anyhow::Result<Limiter> {
    let requests_per_min = requests_per_min.max(1);
    let per_ms = (60_000 / requests_per_min as u64).max(1);

    let cfg = GovernorConfigBuilder::default()
        .per_millisecond(per_ms)
        .burst_size(requests_per_min)
        .key_extractor(PeerIpKeyExtractor)
        .finish()
        .ok_or_else(|| anyhow::anyhow!("invalid rate limit: {requests_per_min}/min"))?;

    Ok(Governor::new(&cfg))
}

/// Mounts `/health` and the protected API. One limiter is shared by all workers.
pub fn configure(cfg: &mut web::ServiceConfig, config: &Config, protected_limiter: Arc<Limiter>) {
    cfg.service(health);

    // Protected routes
    cfg.service(
        web::scope(&config.api_prefix)
            .wrap(from_fn(auth_middleware))
            .wrap(protected_limiter)
            .service(
                web::scope("/employee")
                    // /employee
                    .service(
                        web::resource("")
                            .route(web::post().to(employee::create_employee))
                            .route(web::get().to(employee::list_employees)),
                    )
                    // /employee/{employee_id}
                    .service(
                        web::resource("/{employee_id}")
                            .route(web::put().to(employee::update_employee))
                            .route(web::get().to(employee::get_employee))
                            .route(web::delete().to(employee::delete_employee)),
                    ),
            )
            .service(
                web::scope("/payroll")
                    .service(web::resource("/upsert").route(web::post().to(payroll::upsert_payroll)))
                    .service(
                        web::resource("/payroll-list").route(web::get().to(payroll::list_payroll)),
                    )
                    .service(
                        web::resource("/payroll/{employee_id}")
                            .route(web::get().to(payroll::get_employee_payroll)),
                    )
                    .service(
                        web::resource("/incentive/{employee_id}")
                            .route(web::get().to(payroll::calculate_incentive)),
                    ),
            )
            .service(
                web::scope("/rating")
                    .service(
                        web::resource("")
                            .route(web::post().to(rating::upsert_rating))
                            .route(web::get().to(rating::list_ratings)),
                    )
                    .service(
                        web::resource("/current/{employee_id}")
                            .route(web::get().to(rating::get_current_rating)),
                    )
                    .service(
                        web::resource("/history/{employee_id}")
                            .route(web::get().to(rating::get_rating_history)),
                    )
                    .service(
                        web::resource("/{employee_id}")
                            .route(web::get().to(rating::get_monthly_rating)),
                    ),
            )
            .service(
                web::scope("/salary")
                    // before /{employee_id} so "details" is not read as an id
                    .service(
                        web::resource("/details/{employee_id}")
                            .route(web::get().to(salary::get_salary_details)),
                    )
                    .service(
                        web::resource("/{employee_id}")
                            .route(web::get().to(salary::get_yearly_salary)),
                    ),
            )
            .service(
                web::scope("/team-incentive")
                    .service(
                        web::resource("")
                            .route(web::post().to(team_incentive::create_incentive))
                            .route(web::get().to(team_incentive::list_incentives)),
                    )
                    .service(
                        web::resource("/member/{employee_id}")
                            .route(web::get().to(team_incentive::get_member_incentive)),
                    )
                    .service(
                        web::resource("/{incentive_id}")
                            .route(web::get().to(team_incentive::get_incentive))
                            .route(web::put().to(team_incentive::update_incentive))
                            .route(web::delete().to(team_incentive::delete_incentive)),
                    ),
            )
            .service(
                web::scope("/export")
                    .service(web::resource("/payroll").route(web::get().to(export::export_payroll))),
            ),
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::jwt::{generate_access_token, generate_token};
    use crate::models::TokenType;
    use crate::model::role::Role;
    use crate::utils::period::{Clock, FixedClock};
    use actix_web::{App, http::StatusCode, test, web::Data};
    use chrono::NaiveDate;
    use sqlx::mysql::MySqlPoolOptions;
    use std::net::SocketAddr;

    const SECRET: &str = "test-secret";

    fn config() -> Config {
        Config {
            database_url: "mysql://root@127.0.0.1:1/none".into(),
            db_max_connections: 1,
            jwt_secret: SECRET.into(),
            server_addr: "127.0.0.1:0".into(),
            rate_protected_per_min: 1000,
            api_prefix: "/api".into(),
            log_dir: "logs".into(),
            log_level: "debug".into(),
        }
    }

    fn peer() -> SocketAddr {
        "127.0.0.1:40000".parse().unwrap()
    }

    macro_rules! app {
        () => {{
            let config = config();
            // never connects: every request below is rejected before a query runs
            let pool = MySqlPoolOptions::new()
                .connect_lazy(&config.database_url)
                .unwrap();
            let limiter = Arc::new(build_limiter(config.rate_protected_per_min).unwrap());
            let clock: Arc<dyn Clock> =
                Arc::new(FixedClock(NaiveDate::from_ymd_opt(2025, 9, 17).unwrap()));
            test::init_service(
                App::new()
                    .app_data(Data::new(pool))
                    .app_data(Data::new(config.clone()))
                    .app_data(Data::from(clock))
                    .configure(|cfg| configure(cfg, &config, limiter)),
            )
            .await
        }};
    }

    fn bearer(role: Role, employee_id: Option<u64>) -> (&'static str, String) {
        let token = generate_access_token(1, role as u8, employee_id, SECRET);
        ("Authorization", format!("Bearer {token}"))
    }

    #[actix_web::test]
    async fn health_is_public() {
        let app = app!();
        let req = test::TestRequest::get().uri("/health").peer_addr(peer()).to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::OK);
    }

    #[actix_web::test]
    async fn missing_token_is_unauthorized() {
        let app = app!();
        let req = test::TestRequest::get()
            .uri("/api/payroll/payroll-list")
            .peer_addr(peer())
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    }

    #[actix_web::test]
    async fn refresh_token_is_unauthorized() {
        let app = app!();
        let token = generate_token(1, Role::Admin as u8, None, SECRET, TokenType::Refresh);
        let req = test::TestRequest::get()
            .uri("/api/payroll/payroll-list")
            .insert_header(("Authorization", format!("Bearer {token}")))
            .peer_addr(peer())
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    }

    #[actix_web::test]
    async fn employees_cannot_write_ratings() {
        let app = app!();
        let req = test::TestRequest::post()
            .uri("/api/rating")
            .insert_header(bearer(Role::Employee, Some(7)))
            .set_json(serde_json::json!({"employeeId": 7}))
            .peer_addr(peer())
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::FORBIDDEN);
    }

    #[actix_web::test]
    async fn employees_cannot_read_others() {
        let app = app!();
        let req = test::TestRequest::get()
            .uri("/api/rating/history/8")
            .insert_header(bearer(Role::Employee, Some(7)))
            .peer_addr(peer())
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::FORBIDDEN);
    }

    #[actix_web::test]
    async fn rating_without_categories_is_bad_request() {
        let app = app!();
        let req = test::TestRequest::post()
            .uri("/api/rating")
            .insert_header(bearer(Role::Hr, None))
            .set_json(serde_json::json!({"employeeId": 7, "month": 9, "year": 2025}))
            .peer_addr(peer())
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    }

    #[actix_web::test]
    async fn payroll_with_negative_counters_is_bad_request() {
        let app = app!();
        let req = test::TestRequest::post()
            .uri("/api/payroll/upsert")
            .insert_header(bearer(Role::Hr, None))
            .set_json(serde_json::json!({
                "employeeId": 7,
                "totalDays": 30,
                "salary": 30000,
                "absent": -10,
                "lateIn": -4,
                "deductions": -500
            }))
            .peer_addr(peer())
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    }

    #[actix_web::test]
    async fn invalid_month_is_bad_request() {
        let app = app!();
        let req = test::TestRequest::get()
            .uri("/api/rating?month=13")
            .insert_header(bearer(Role::Admin, None))
            .peer_addr(peer())
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    }

    #[actix_web::test]
    async fn team_incentive_needs_positive_amount() {
        let app = app!();
        let req = test::TestRequest::post()
            .uri("/api/team-incentive")
            .insert_header(bearer(Role::Admin, Some(1)))
            .set_json(serde_json::json!({"team": "Engineering", "memberIds": [1], "totalAmount": 0}))
            .peer_addr(peer())
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    }

    #[::core::prelude::v1::test]
    fn zero_rate_still_builds_a_limiter() {
        assert!(build_limiter(0).is_ok());
        assert!(build_limiter(120_000).is_ok());
    }
}
