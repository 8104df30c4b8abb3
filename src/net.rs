use std::sync::mpsc::{Receiver, RecvTimeoutError, Sender};
use std::thread;
use std::time::Duration;

use chrono::Utc;
use reqwest::blocking::{Client, RequestBuilder};
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::{debug, error, info, warn};

use crate::board::{split_fids, FetchCycle};
use crate::config::Config;
use crate::model::{
    CheckWxResponse, FeedResult, FidsResponse, OpenSkyResponse, RawFlightRecord, WeatherReport,
};

const FIDS_QUERY: [(&str, &str); 9] = [
    ("offsetMinutes", "-120"),
    ("durationMinutes", "720"),
    ("withLeg", "true"),
    ("direction", "Both"),
    ("withCancelled", "true"),
    ("withCodeshared", "true"),
    ("withCargo", "true"),
    ("withPrivate", "true"),
    ("withLocation", "false"),
];

#[derive(Clone, Debug)]
pub struct Endpoints {
    pub checkwx_base: String,
    pub checkwx_api_key: String,
    pub aerodatabox_host: String,
    pub aerodatabox_api_key: String,
    pub opensky_url: String,
    pub timeout: Duration,
}

impl Endpoints {
    pub fn from_config(config: &Config) -> Self {
        Endpoints {
            checkwx_base: config.checkwx_base.clone(),
            checkwx_api_key: config.checkwx_api_key.clone(),
            aerodatabox_host: config.aerodatabox_host.clone(),
            aerodatabox_api_key: config.aerodatabox_api_key.clone(),
            opensky_url: config.opensky_url.clone(),
            timeout: config.timeout,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum FetchCommand {
    Refresh,
    SetAirport(String),
}

pub fn build_client(timeout: Duration) -> Result<Client, String> {
    Client::builder()
        .timeout(timeout)
        .build()
        .map_err(|err| format!("Error: client setup failed: {err}"))
}

/// Polls all three providers every `refresh` until the receiver goes away.
pub fn spawn_fetcher(
    endpoints: Endpoints,
    airport: String,
    refresh: Duration,
    tx: Sender<FetchCycle>,
    commands: Receiver<FetchCommand>,
) {
    thread::spawn(move || {
        info!("fetcher started for {airport}");
        let client = match build_client(endpoints.timeout) {
            Ok(client) => client,
            Err(err) => {
                error!("{err}");
                let _ = tx.send(failed_cycle(&airport, err));
                return;
            }
        };

        let mut airport = airport;
        loop {
            let cycle = fetch_cycle(&client, &endpoints, &airport);
            if tx.send(cycle).is_err() {
                debug!("receiver dropped, exiting fetcher");
                break;
            }

            match commands.recv_timeout(refresh) {
                Ok(FetchCommand::Refresh) | Err(RecvTimeoutError::Timeout) => {}
                Ok(FetchCommand::SetAirport(code)) => {
                    info!("fetcher switching airport {airport} -> {code}");
                    airport = code;
                }
                Err(RecvTimeoutError::Disconnected) => {
                    debug!("command channel closed, exiting fetcher");
                    break;
                }
            }
        }
    });
}

/// Fetches one snapshot. Each provider fails independently.
pub fn fetch_cycle(client: &Client, endpoints: &Endpoints, airport: &str) -> FetchCycle {
    let airport = airport.trim().to_ascii_uppercase();
    let metar = fetch_weather(client, endpoints, "metar", &airport);
    let taf = fetch_weather(client, endpoints, "taf", &airport);
    let (departures, arrivals) = split_fids(fetch_fids(client, endpoints, &airport));
    let states = fetch_states(client, endpoints);

    for (feed, failure) in [
        ("metar", metar.as_ref().err()),
        ("taf", taf.as_ref().err()),
        ("fids", departures.as_ref().err()),
        ("states", states.as_ref().err()),
    ] {
        if let Some(message) = failure {
            warn!("{feed} fetch failed for {airport}: {message}");
        }
    }

    FetchCycle {
        airport,
        metar,
        taf,
        departures,
        arrivals,
        states,
        fetched_at: Utc::now(),
    }
}

fn failed_cycle(airport: &str, message: String) -> FetchCycle {
    FetchCycle {
        airport: airport.to_string(),
        metar: Err(message.clone()),
        taf: Err(message.clone()),
        departures: Err(message.clone()),
        arrivals: Err(message.clone()),
        states: Err(message),
        fetched_at: Utc::now(),
    }
}

pub fn fetch_weather(
    client: &Client,
    endpoints: &Endpoints,
    kind: &str,
    airport: &str,
) -> WeatherReport {
    let url = format!(
        "{}/{kind}/{}/decoded",
        endpoints.checkwx_base.trim_end_matches('/'),
        airport.to_ascii_uppercase()
    );
    let req = with_header(client.get(&url), "X-API-Key", &endpoints.checkwx_api_key);
    let data: CheckWxResponse = fetch_json(req)?;
    Ok(data.first_raw_text())
}

pub fn fetch_fids(
    client: &Client,
    endpoints: &Endpoints,
    airport: &str,
) -> FeedResult<(Vec<RawFlightRecord>, Vec<RawFlightRecord>)> {
    let url = build_fids_url(&endpoints.aerodatabox_host, airport);
    let mut req = with_header(
        client.get(&url),
        "x-rapidapi-key",
        &endpoints.aerodatabox_api_key,
    );
    req = with_header(req, "x-rapidapi-host", host_name(&endpoints.aerodatabox_host));
    let data: FidsResponse = fetch_json(req)?;
    debug!(
        "fids for {airport}: {} departures, {} arrivals",
        data.departures.len(),
        data.arrivals.len()
    );
    Ok((data.departures, data.arrivals))
}

pub fn fetch_states(client: &Client, endpoints: &Endpoints) -> FeedResult<Vec<Value>> {
    let data: OpenSkyResponse = fetch_json(client.get(&endpoints.opensky_url))?;
    Ok(data.states)
}

/// FIDS lookups go by ICAO for four-letter codes and by IATA otherwise.
pub fn build_fids_url(host: &str, airport: &str) -> String {
    let code = airport.trim().to_ascii_uppercase();
    let kind = if code.chars().count() == 4 { "icao" } else { "iata" };
    let base = if host.starts_with("http://") || host.starts_with("https://") {
        host.trim_end_matches('/').to_string()
    } else {
        format!("https://{}", host.trim_end_matches('/'))
    };
    let query = FIDS_QUERY
        .iter()
        .map(|(key, value)| format!("{key}={value}"))
        .collect::<Vec<_>>()
        .join("&");
    format!("{base}/flights/airports/{kind}/{code}?{query}")
}

fn host_name(host: &str) -> &str {
    host.trim_start_matches("https://")
        .trim_start_matches("http://")
        .trim_end_matches('/')
}

fn with_header(req: RequestBuilder, name: &str, value: &str) -> RequestBuilder {
    if value.trim().is_empty() {
        req
    } else {
        req.header(name, value.trim())
    }
}

fn fetch_json<T: DeserializeOwned>(req: RequestBuilder) -> Result<T, String> {
    let resp = req.send().map_err(|err| format!("Error: {err}"))?;
    let status = resp.status();
    if !status.is_success() {
        return Err(format!("Error: HTTP {status}"));
    }
    resp.json::<T>().map_err(|err| format!("Error: {err}"))
}

#[cfg(test)]
mod tests {
    use super::{build_fids_url, host_name};

    #[test]
    fn fids_url_picks_icao_or_iata() {
        let url = build_fids_url("aerodatabox.p.rapidapi.com", " egnm ");
        assert!(url.starts_with("https://aerodatabox.p.rapidapi.com/flights/airports/icao/EGNM?"));
        assert!(url.contains("offsetMinutes=-120"));
        assert!(url.contains("durationMinutes=720"));
        assert!(url.ends_with("withLocation=false"));

        let url = build_fids_url("aerodatabox.p.rapidapi.com", "lba");
        assert!(url.contains("/flights/airports/iata/LBA?"));
    }

    #[test]
    fn fids_url_keeps_explicit_scheme() {
        let url = build_fids_url("http://127.0.0.1:9000/", "EGNM");
        assert!(url.starts_with("http://127.0.0.1:9000/flights/airports/icao/EGNM?"));
        assert_eq!(host_name("http://127.0.0.1:9000/"), "127.0.0.1:9000");
        assert_eq!(host_name("aerodatabox.p.rapidapi.com"), "aerodatabox.p.rapidapi.com");
    }
}

#[cfg(all(test, feature = "net-tests"))]
mod net_tests {
    use super::{build_client, fetch_fids, fetch_states, Endpoints};
    use std::io::{Read, Write};
    use std::net::TcpListener;
    use std::thread;
    use std::time::Duration;

    fn serve_once(status: &'static str, body: &'static str) -> Option<String> {
        let listener = TcpListener::bind("127.0.0.1:0").ok()?;
        let addr = listener.local_addr().ok()?;
        thread::spawn(move || {
            if let Ok((mut stream, _)) = listener.accept() {
                let mut buf = [0u8; 1024];
                let _ = stream.read(&mut buf);
                let response = format!(
                    "HTTP/1.1 {status}\r\nContent-Length: {}\r\nContent-Type: application/json\r\n\r\n{}",
                    body.len(),
                    body
                );
                let _ = stream.write_all(response.as_bytes());
            }
        });
        Some(format!("http://{addr}"))
    }

    fn endpoints(base: &str) -> Endpoints {
        Endpoints {
            checkwx_base: base.to_string(),
            checkwx_api_key: String::new(),
            aerodatabox_host: base.to_string(),
            aerodatabox_api_key: "key".to_string(),
            opensky_url: format!("{base}/api/states/all"),
            timeout: Duration::from_secs(5),
        }
    }

    #[test]
    fn fetch_fids_paths() {
        let client = build_client(Duration::from_secs(5)).unwrap();
        let Some(base) = serve_once(
            "200 OK",
            r#"{"departures":[{"number":"LS 871"}],"arrivals":null}"#,
        ) else {
            return;
        };
        let (departures, arrivals) = fetch_fids(&client, &endpoints(&base), "EGNM").unwrap();
        assert_eq!(departures.len(), 1);
        assert!(arrivals.is_empty());
    }

    #[test]
    fn http_errors_become_messages() {
        let client = build_client(Duration::from_secs(5)).unwrap();
        let Some(base) = serve_once("429 Too Many Requests", "{}") else {
            return;
        };
        let err = fetch_states(&client, &endpoints(&base)).unwrap_err();
        assert!(err.starts_with("Error: HTTP 429"));
    }
}
