use actix_web::{
    body::MessageBody,
    dev::{Service, ServiceResponse},
    error::ResponseError,
    http::StatusCode,
    test::TestRequest,
    Error,
};

/// Drives a request through an initialised test service, flattening both successful responses and errors (which
/// actix surfaces as `Err` from middleware) into a status + body pair.
pub async fn send_request<S, B>(service: &S, req: TestRequest) -> (StatusCode, String)
where
    S: Service<actix_http::Request, Response = ServiceResponse<B>, Error = Error>,
    B: MessageBody,
{
    match service.call(req.to_request()).await {
        Ok(res) => {
            let status = res.status();
            let body = res.into_body().try_into_bytes().map(|b| String::from_utf8_lossy(&b).into_owned());
            (status, body.unwrap_or_default())
        },
        Err(e) => {
            let res = e.error_response();
            let status = res.status();
            let body = res.into_body().try_into_bytes().map(|b| String::from_utf8_lossy(&b).into_owned());
            (status, body.unwrap_or_default())
        },
    }
}
