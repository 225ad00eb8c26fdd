use crate::router::Params;
use crate::swapi::FilmClient;
use std::sync::Arc;

pub async fn get(params: Params, client: Arc<FilmClient>) -> String {
    let id = params.get("id").map(String::as_str).unwrap_or_default();
    match client.find_by_episode(id).await {
        Ok(film) => match serde_json::to_string(&film) {
            Ok(body) => body,
            Err(e) => {
                log::error!("film {:?} -> [encode error] {}", id, e);
                error_body("Internal Server Error")
            }
        },
        Err(e) => {
            log::warn!("film {:?} -> [lookup failed] {}", id, e);
            error_body(&e.to_string())
        }
    }
}

// Lookup failures still answer 200; the failure rides in a JSON envelope.
fn error_body(message: &str) -> String {
    serde_json::json!({ "error": message }).to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn missing_params_become_an_invalid_id() {
        let client = Arc::new(FilmClient::new("http://127.0.0.1:1/".parse().unwrap()).unwrap());
        let body = get(Params::new(), client).await;

        let envelope: serde_json::Value = serde_json::from_str(&body).unwrap();
        assert!(envelope["error"]
            .as_str()
            .unwrap()
            .contains("invalid film id"));
    }
}
