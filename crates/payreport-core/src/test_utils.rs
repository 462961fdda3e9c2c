//! Test utilities for payreport-core
//!
//! This module provides a mock rate server that speaks the central bank's
//! daily XML document layout, for integration tests and offline development.

use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    routing::get,
    Router,
};
use chrono::NaiveDate;
use rust_decimal::Decimal;
use tokio::sync::oneshot;

use crate::models::Currency;

struct MockState {
    rates: HashMap<NaiveDate, Vec<(Currency, Decimal)>>,
    requests: AtomicUsize,
}

/// Mock rate document server for testing and development
///
/// Serves `/kurlar/{YYYYMM}/{DDMMYYYY}.xml` for every day in its table and
/// 404 for every other day, like weekends and holidays upstream.
pub struct MockRateServer {
    addr: SocketAddr,
    state: Arc<MockState>,
    shutdown_tx: Option<oneshot::Sender<()>>,
}

impl MockRateServer {
    /// Start the mock server on an available port
    pub async fn start(rates: &[(NaiveDate, Currency, Decimal)]) -> Self {
        let mut table: HashMap<NaiveDate, Vec<(Currency, Decimal)>> = HashMap::new();
        for (date, currency, rate) in rates {
            table.entry(*date).or_default().push((*currency, *rate));
        }

        let state = Arc::new(MockState {
            rates: table,
            requests: AtomicUsize::new(0),
        });

        let app = Router::new()
            .route("/kurlar/:month/:file", get(handle_document))
            .with_state(state.clone());

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        let (shutdown_tx, shutdown_rx) = oneshot::channel();

        tokio::spawn(async move {
            axum::serve(listener, app)
                .with_graceful_shutdown(async {
                    shutdown_rx.await.ok();
                })
                .await
                .unwrap();
        });

        Self {
            addr,
            state,
            shutdown_tx: Some(shutdown_tx),
        }
    }

    /// Base URL to use as `rates.base_url`
    pub fn url(&self) -> String {
        format!("http://{}/kurlar", self.addr)
    }

    /// Number of document requests served (including misses)
    pub fn requests(&self) -> usize {
        self.state.requests.load(Ordering::SeqCst)
    }

    /// Stop the mock server
    pub fn stop(&mut self) {
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(());
        }
    }
}

impl Drop for MockRateServer {
    fn drop(&mut self) {
        self.stop();
    }
}

async fn handle_document(
    State(state): State<Arc<MockState>>,
    Path((month, file)): Path<(String, String)>,
) -> Response {
    state.requests.fetch_add(1, Ordering::SeqCst);

    let date = file
        .strip_suffix(".xml")
        .and_then(|stem| NaiveDate::parse_from_str(stem, "%d%m%Y").ok())
        .filter(|date| date.format("%Y%m").to_string() == month);

    match date.and_then(|date| state.rates.get(&date).map(|rates| (date, rates))) {
        Some((date, rates)) => (
            [(header::CONTENT_TYPE, "application/xml")],
            render_rate_document(date, rates),
        )
            .into_response(),
        None => StatusCode::NOT_FOUND.into_response(),
    }
}

/// Render a daily rate document in the upstream layout
pub fn render_rate_document(date: NaiveDate, rates: &[(Currency, Decimal)]) -> String {
    let mut xml = String::from(
        "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n\
         <?xml-stylesheet type=\"text/xsl\" href=\"isokur.xsl\"?>\n",
    );
    xml.push_str(&format!(
        "<Tarih_Date Tarih=\"{}\" Date=\"{}\" Bulten_No=\"{}/1\">\n",
        date.format("%d.%m.%Y"),
        date.format("%m/%d/%Y"),
        date.format("%Y")
    ));

    for (order, (currency, rate)) in rates.iter().enumerate() {
        let code = currency.source_code();
        xml.push_str(&format!(
            "  <Currency CrossOrder=\"{order}\" Kod=\"{code}\" CurrencyCode=\"{code}\">\n\
             \x20   <Unit>1</Unit>\n\
             \x20   <CurrencyName>{code}</CurrencyName>\n\
             \x20   <ForexBuying>{rate}</ForexBuying>\n\
             \x20   <ForexSelling>{rate}</ForexSelling>\n\
             \x20   <BanknoteBuying/>\n\
             \x20   <BanknoteSelling/>\n\
             \x20 </Currency>\n"
        ));
    }

    xml.push_str("</Tarih_Date>\n");
    xml
}
