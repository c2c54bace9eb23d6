use axum::response::Response;

/// ANY /do-panic - Panics on purpose to exercise the recovery stage
pub async fn do_panic() -> Response {
    panic!("deliberate panic from /do-panic")
}
