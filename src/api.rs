use std::convert::Infallible;
use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;

use tracing::{debug, error};
use warp::http::StatusCode;
use warp::{Filter, Rejection, Reply};

use crate::metrics::Metrics;
use crate::position::Direction;
use crate::servo::Servo;
use crate::Result;

pub const INDEX_HTML: &str = include_str!("../static/index.html");

/// Every route the service answers. Anything unmatched, including a known
/// path with the wrong method, is a 404.
pub fn routes(
    servo: Arc<Servo>,
    metrics: Metrics,
) -> impl Filter<Extract = (impl Reply,), Error = Infallible> + Clone + Send + Sync + 'static {
    let index = warp::get()
        .and(warp::path::end().or(warp::path!("index.html")).unify())
        .map(|| warp::reply::html(INDEX_HTML));

    let direction = warp::path!("api" / "left")
        .map(|| Direction::Left)
        .or(warp::path!("api" / "right").map(|| Direction::Right))
        .unify();

    let control = warp::post()
        .and(direction)
        .and(with_servo(servo))
        .and_then(step);

    let scrape = metrics.clone();
    let exposition = warp::get()
        .and(warp::path!("metrics"))
        .map(move || render_metrics(&scrape));

    index
        .or(control)
        .or(exposition)
        .recover(not_found)
        .with(warp::log::custom(move |info| {
            let handler = handler_name(info.status(), info.path());
            debug!(
                method = %info.method(),
                path = info.path(),
                status = info.status().as_u16(),
                "request"
            );
            metrics.observe(info.status().as_u16(), handler, info.method().as_str());
        }))
}

/// Bind the routes on `addr`; the returned future serves until `stop`
/// resolves and in-flight requests drain.
pub fn bind(
    servo: Arc<Servo>,
    metrics: Metrics,
    addr: SocketAddr,
    stop: impl Future<Output = ()> + Send + 'static,
) -> Result<(SocketAddr, impl Future<Output = ()> + 'static)> {
    let bound = warp::serve(routes(servo, metrics)).try_bind_with_graceful_shutdown(addr, stop)?;
    Ok(bound)
}

fn with_servo(
    servo: Arc<Servo>,
) -> impl Filter<Extract = (Arc<Servo>,), Error = Infallible> + Clone {
    warp::any().map(move || servo.clone())
}

async fn step(
    direction: Direction,
    servo: Arc<Servo>,
) -> std::result::Result<impl Reply, Infallible> {
    // driver writes block, keep them off the reactor
    let res = tokio::task::spawn_blocking(move || servo.step(direction)).await;

    let status = match res {
        Ok(Ok(_)) => StatusCode::OK,
        Ok(Err(e)) => {
            error!(error = %e, %direction, "failed to move servo");
            StatusCode::INTERNAL_SERVER_ERROR
        }
        Err(e) => {
            error!(error = %e, %direction, "servo task did not complete");
            StatusCode::INTERNAL_SERVER_ERROR
        }
    };
    Ok(status)
}

fn render_metrics(metrics: &Metrics) -> impl Reply {
    match metrics.render() {
        Ok(body) => warp::reply::with_status(
            warp::reply::with_header(body, "content-type", prometheus::TEXT_FORMAT),
            StatusCode::OK,
        ),
        Err(e) => {
            error!(error = %e, "failed to render metrics");
            warp::reply::with_status(
                warp::reply::with_header(String::new(), "content-type", prometheus::TEXT_FORMAT),
                StatusCode::INTERNAL_SERVER_ERROR,
            )
        }
    }
}

async fn not_found(_: Rejection) -> std::result::Result<StatusCode, Infallible> {
    Ok(StatusCode::NOT_FOUND)
}

fn handler_name(status: StatusCode, path: &str) -> &'static str {
    if status == StatusCode::NOT_FOUND {
        return "not_found";
    }
    match path {
        "/" | "/index.html" => "index",
        "/api/left" => "left",
        "/api/right" => "right",
        "/metrics" => "metrics",
        _ => "not_found",
    }
}
