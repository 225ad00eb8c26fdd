use crate::http::{self, CatalogueClient};
use http_body_util::{BodyExt, Empty};
use hyper::body::Bytes;
use hyper::{header, Request, StatusCode, Uri};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::io;
use std::ops::RangeInclusive;
use std::time::Duration;

pub const DEFAULT_FILMS_URL: &str = "https://swapi.py4e.com/api/films/?format=json";

const EPISODE_RANGE: RangeInclusive<i64> = 1..=7;
const FETCH_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Film {
    pub title: String,
    pub episode_id: i64,
    pub opening_crawl: String,
    pub director: String,
    pub producer: String,
    pub release_date: String,
}

#[derive(Debug, thiserror::Error)]
pub enum LookupError {
    #[error("invalid film id {0:?}: expected an integer between 1 and 7")]
    InvalidId(String),
    #[error("no film with episode {0}")]
    NotFound(i64),
    #[error("catalogue request failed: {0}")]
    Transport(String),
    #[error("catalogue response malformed: {0}")]
    Parse(String),
}

// The upstream wraps its film list in a paging envelope; only the records
// matter here.
#[derive(Deserialize)]
struct Catalogue {
    results: Vec<Value>,
}

pub struct FilmClient {
    client: CatalogueClient,
    films_url: Uri,
}

impl FilmClient {
    pub fn new(films_url: Uri) -> Result<Self, io::Error> {
        Ok(FilmClient {
            client: http::make_client()?,
            films_url,
        })
    }

    pub async fn find_by_episode(&self, id: &str) -> Result<Film, LookupError> {
        let episode = id
            .parse::<i64>()
            .ok()
            .filter(|episode| EPISODE_RANGE.contains(episode))
            .ok_or_else(|| LookupError::InvalidId(id.to_owned()))?;

        let catalogue = tokio::time::timeout(FETCH_TIMEOUT, self.fetch_catalogue())
            .await
            .map_err(|_| {
                LookupError::Transport(format!("timed out after {}s", FETCH_TIMEOUT.as_secs()))
            })??;

        // Records without a well-formed integer episode number are skipped,
        // not errors; only the record that matches must deserialize fully.
        for record in catalogue.results {
            if record.get("episode_id").and_then(Value::as_i64) == Some(episode) {
                return serde_json::from_value(record)
                    .map_err(|e| LookupError::Parse(e.to_string()));
            }
        }
        Err(LookupError::NotFound(episode))
    }

    async fn fetch_catalogue(&self) -> Result<Catalogue, LookupError> {
        let req = Request::get(self.films_url.clone())
            .header(header::ACCEPT, "application/json")
            .body(Empty::<Bytes>::new())
            .map_err(|e| LookupError::Transport(e.to_string()))?;

        let resp = self
            .client
            .request(req)
            .await
            .map_err(|e| LookupError::Transport(e.to_string()))?;

        if resp.status() != StatusCode::OK {
            return Err(LookupError::Transport(format!(
                "unexpected status {}",
                resp.status()
            )));
        }

        let body = resp
            .into_body()
            .collect()
            .await
            .map_err(|e| LookupError::Transport(e.to_string()))?
            .to_bytes();

        serde_json::from_slice(&body).map_err(|e| LookupError::Parse(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use http_body_util::Full;
    use hyper::body::Incoming;
    use hyper::http::HeaderValue;
    use hyper::server::conn::http1;
    use hyper::service::service_fn;
    use hyper::Response;
    use hyper_util::rt::TokioIo;
    use std::convert::Infallible;
    use std::net::SocketAddr;
    use tokio::net::TcpListener;

    const CATALOGUE: &str = r#"{
        "count": 2,
        "next": null,
        "results": [
            {
                "title": "The Empire Strikes Back",
                "episode_id": 5,
                "opening_crawl": "It is a dark time for the Rebellion.",
                "director": "Irvin Kershner",
                "producer": "Gary Kurtz, Rick McCallum",
                "release_date": "1980-05-17",
                "url": "https://swapi.py4e.com/api/films/2/"
            },
            {
                "title": "A New Hope",
                "episode_id": 4,
                "opening_crawl": "It is a period of civil war.",
                "director": "George Lucas",
                "producer": "Gary Kurtz, Rick McCallum",
                "release_date": "1977-05-25",
                "url": "https://swapi.py4e.com/api/films/1/"
            }
        ]
    }"#;

    // Serves a canned response on a local port; requests missing the JSON
    // accept header are refused.
    async fn stub_catalogue(status: StatusCode, body: &'static str) -> SocketAddr {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            loop {
                let (tcp, _) = match listener.accept().await {
                    Ok(conn) => conn,
                    Err(_) => return,
                };
                tokio::spawn(async move {
                    let serve = service_fn(move |req: Request<Incoming>| async move {
                        let accepts_json = req.headers().get(header::ACCEPT)
                            == Some(&HeaderValue::from_static("application/json"));
                        let mut resp =
                            Response::new(Full::new(Bytes::from_static(body.as_bytes())));
                        *resp.status_mut() = if accepts_json {
                            status
                        } else {
                            StatusCode::NOT_ACCEPTABLE
                        };
                        Ok::<_, Infallible>(resp)
                    });
                    let _ = http1::Builder::new()
                        .serve_connection(TokioIo::new(tcp), serve)
                        .await;
                });
            }
        });
        addr
    }

    fn client_for(addr: SocketAddr) -> FilmClient {
        let films_url = format!("http://{}/api/films/?format=json", addr);
        FilmClient::new(films_url.parse().unwrap()).unwrap()
    }

    #[tokio::test]
    async fn finds_a_film_by_episode() {
        let addr = stub_catalogue(StatusCode::OK, CATALOGUE).await;
        let film = client_for(addr).find_by_episode("4").await.unwrap();
        assert_eq!(film.title, "A New Hope");
        assert_eq!(film.episode_id, 4);
        assert_eq!(film.director, "George Lucas");
        assert_eq!(film.producer, "Gary Kurtz, Rick McCallum");
        assert_eq!(film.release_date, "1977-05-25");
    }

    #[tokio::test]
    async fn rejects_ids_outside_the_saga() {
        // Port 1 refuses connections, so validation must fail before any
        // fetch is attempted.
        let client = FilmClient::new("http://127.0.0.1:1/".parse().unwrap()).unwrap();
        for id in ["abc", "", "4.5", "0", "8", "99"] {
            let err = client.find_by_episode(id).await.unwrap_err();
            assert!(
                matches!(&err, LookupError::InvalidId(bad) if bad == id),
                "{:?}: {}",
                id,
                err
            );
        }
    }

    #[tokio::test]
    async fn skips_records_without_a_well_formed_episode() {
        let catalogue = r#"{"results": [
            {"title": "no episode at all"},
            {"title": "episode as text", "episode_id": "4"},
            {"title": "episode as fraction", "episode_id": 4.5},
            "not even a record",
            {
                "title": "A New Hope",
                "episode_id": 4,
                "opening_crawl": "It is a period of civil war.",
                "director": "George Lucas",
                "producer": "Gary Kurtz, Rick McCallum",
                "release_date": "1977-05-25"
            }
        ]}"#;
        let addr = stub_catalogue(StatusCode::OK, catalogue).await;
        let film = client_for(addr).find_by_episode("4").await.unwrap();
        assert_eq!(film.title, "A New Hope");
    }

    #[tokio::test]
    async fn unmatched_episodes_are_not_found() {
        let addr = stub_catalogue(StatusCode::OK, CATALOGUE).await;
        let err = client_for(addr).find_by_episode("3").await.unwrap_err();
        assert!(matches!(&err, LookupError::NotFound(3)), "{}", err);
    }

    #[tokio::test]
    async fn matched_records_must_deserialize_fully() {
        let catalogue = r#"{"results": [{"title": "A New Hope", "episode_id": 4}]}"#;
        let addr = stub_catalogue(StatusCode::OK, catalogue).await;
        let err = client_for(addr).find_by_episode("4").await.unwrap_err();
        assert!(matches!(&err, LookupError::Parse(_)), "{}", err);
    }

    #[tokio::test]
    async fn non_success_statuses_are_transport_errors() {
        let addr = stub_catalogue(StatusCode::INTERNAL_SERVER_ERROR, "oops").await;
        let err = client_for(addr).find_by_episode("1").await.unwrap_err();
        assert!(matches!(&err, LookupError::Transport(_)), "{}", err);
    }

    #[tokio::test]
    async fn malformed_catalogue_bodies_are_parse_errors() {
        let addr = stub_catalogue(StatusCode::OK, "these are not the droids").await;
        let err = client_for(addr).find_by_episode("1").await.unwrap_err();
        assert!(matches!(&err, LookupError::Parse(_)), "{}", err);

        let addr = stub_catalogue(StatusCode::OK, r#"{"films": []}"#).await;
        let err = client_for(addr).find_by_episode("1").await.unwrap_err();
        assert!(matches!(&err, LookupError::Parse(_)), "{}", err);
    }

    #[tokio::test]
    async fn unreachable_catalogues_are_transport_errors() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let err = client_for(addr).find_by_episode("1").await.unwrap_err();
        assert!(matches!(&err, LookupError::Transport(_)), "{}", err);
    }
}
