use crate::challenge::event::{
    ChallengeAttempt, ChallengeEvent, ChallengeKind, ChallengeRequest, ChallengeResponse,
    PrivateParams, PublicParams, TriggerKind,
};
use crate::sesamo::handlers::{health, trigger};
use utoipa::OpenApi;

#[derive(OpenApi)]
#[openapi(
    paths(health::health, trigger::trigger),
    components(schemas(
        ChallengeAttempt,
        ChallengeEvent,
        ChallengeKind,
        ChallengeRequest,
        ChallengeResponse,
        PrivateParams,
        PublicParams,
        TriggerKind,
    )),
    tags(
        (name = "sesamo", description = "OTP challenge orchestrator API")
    )
)]
struct ApiDoc;

#[must_use]
pub fn openapi() -> utoipa::openapi::OpenApi {
    ApiDoc::openapi()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn openapi_documents_the_trigger_routes() {
        let doc = openapi();
        let paths = &doc.paths.paths;
        assert!(paths.contains_key("/health"));
        assert!(paths.contains_key("/v1/trigger"));
    }
}
