use std::{collections::HashMap, sync::Arc};

use axum::{
    Json,
    extract::{Query, State},
};
use visor_addresses::Address;
use visor_consensus_core::tx::UxOutId;
use visor_core::trace;
use visor_hashes::Hash;

use crate::{
    IDENT,
    error::{GatewayError, GatewayResult, HttpError},
    gateway::Gatewayer,
    router::ExplorerState,
    views::{AccountBalanceView, AddressCountView, BlockView, BlocksView, CsrfTokenView, TransactionView, UxOutView},
};

type Params = Query<HashMap<String, String>>;
type HttpResult<T> = Result<Json<T>, HttpError>;

fn param<'a>(params: &'a HashMap<String, String>, name: &str) -> &'a str {
    params.get(name).map(String::as_str).unwrap_or_default()
}

/// Parses a boolean the way `1 t T TRUE true True 0 f F FALSE false False` are commonly accepted
pub fn parse_bool(value: &str) -> Option<bool> {
    match value {
        "1" | "t" | "T" | "TRUE" | "true" | "True" => Some(true),
        "0" | "f" | "F" | "FALSE" | "false" | "False" => Some(false),
        _ => None,
    }
}

/// Runs a gateway query on the blocking pool
async fn query<T, F>(gateway: &Arc<dyn Gatewayer>, op: F) -> Result<T, HttpError>
where
    T: Send + 'static,
    F: FnOnce(&dyn Gatewayer) -> GatewayResult<T> + Send + 'static,
{
    let gateway = gateway.clone();
    match tokio::task::spawn_blocking(move || op(gateway.as_ref())).await {
        Ok(result) => Ok(result?),
        Err(err) => Err(GatewayError::TaskError(err.to_string()).into()),
    }
}

pub async fn method_not_allowed() -> HttpError {
    HttpError::method_not_allowed()
}

pub async fn not_found() -> HttpError {
    HttpError::not_found()
}

/// `GET /explorer/address?address=...`
pub async fn get_transactions_for_address(State(state): State<Arc<ExplorerState>>, Query(params): Params) -> HttpResult<Vec<TransactionView>> {
    let address = param(&params, "address");
    if address.is_empty() {
        return Err(HttpError::bad_request("address is empty"));
    }
    let address = address.parse::<Address>().map_err(|_| HttpError::bad_request("invalid address"))?;
    trace!("[{0}] transactions of {1} requested", IDENT, address);

    let results = query(&state.gateway, move |gateway| gateway.get_address_txns(&address)).await?;
    let views = results.iter().map(TransactionView::from).collect();
    Ok(Json(views))
}

/// `GET /richlist?n=...&include-distribution=...`
pub async fn get_richlist(State(state): State<Arc<ExplorerState>>, Query(params): Params) -> HttpResult<Vec<AccountBalanceView>> {
    let top_n = match param(&params, "n") {
        "" => 0,
        n => n.parse::<usize>().map_err(|_| HttpError::bad_request("invalid n"))?,
    };
    let include_distribution = match param(&params, "include-distribution") {
        "" => false,
        value => parse_bool(value).ok_or_else(|| HttpError::bad_request("invalid include-distribution"))?,
    };

    let richlist = query(&state.gateway, move |gateway| gateway.get_richlist(include_distribution)).await?;
    let len = if top_n == 0 { richlist.len() } else { top_n.min(richlist.len()) };
    Ok(Json(richlist[..len].iter().map(AccountBalanceView::from).collect()))
}

/// `GET /addresscount`
pub async fn get_address_count(State(state): State<Arc<ExplorerState>>) -> HttpResult<AddressCountView> {
    let count = query(&state.gateway, |gateway| gateway.get_address_count()).await?;
    Ok(Json(AddressCountView { count }))
}

/// `GET /uxout?uxid=...`
pub async fn get_uxout(State(state): State<Arc<ExplorerState>>, Query(params): Params) -> HttpResult<UxOutView> {
    let uxid = param(&params, "uxid");
    if uxid.is_empty() {
        return Err(HttpError::bad_request("uxid is empty"));
    }
    let id = uxid.parse::<UxOutId>().map_err(|err| HttpError::bad_request(format!("invalid uxid: {err}")))?;

    match query(&state.gateway, move |gateway| gateway.get_uxout_by_id(&id)).await? {
        Some(record) => Ok(Json(UxOutView::from(&record))),
        None => Err(HttpError::not_found()),
    }
}

/// `GET /block?hash=...` or `GET /block?seq=...`
pub async fn get_block(State(state): State<Arc<ExplorerState>>, Query(params): Params) -> HttpResult<BlockView> {
    let block = match (param(&params, "hash"), param(&params, "seq")) {
        ("", "") => return Err(HttpError::bad_request("should specify one filter, hash or seq")),
        (hash, seq) if !hash.is_empty() && !seq.is_empty() => {
            return Err(HttpError::bad_request("should only specify one filter, hash or seq"));
        }
        (hash, "") => {
            let hash = hash.parse::<Hash>().map_err(|err| HttpError::bad_request(err.to_string()))?;
            query(&state.gateway, move |gateway| gateway.get_block_by_hash(&hash)).await?
        }
        (_, seq) => {
            let seq = seq.parse::<u64>().map_err(|_| HttpError::bad_request(format!("invalid seq value \"{seq}\"")))?;
            query(&state.gateway, move |gateway| gateway.get_block_by_seq(seq)).await?
        }
    };
    match block {
        Some(block) => Ok(Json(BlockView::from(&block))),
        None => Err(HttpError::not_found()),
    }
}

/// `GET /blocks?start=...&end=...`, both bounds inclusive
pub async fn get_blocks(State(state): State<Arc<ExplorerState>>, Query(params): Params) -> HttpResult<BlocksView> {
    let start = param(&params, "start").parse::<u64>().map_err(|_| HttpError::bad_request("invalid start value"))?;
    let end = param(&params, "end").parse::<u64>().map_err(|_| HttpError::bad_request("invalid end value"))?;
    if start > end {
        return Err(HttpError::bad_request("start must not be greater than end"));
    }

    let blocks = query(&state.gateway, move |gateway| match gateway.head_seq()? {
        Some(head) if start <= head => gateway.get_blocks(start, end).map(Some),
        _ => Ok(None),
    })
    .await?;
    match blocks {
        Some(blocks) => Ok(Json(BlocksView { blocks: blocks.iter().map(BlockView::from).collect() })),
        None => Err(HttpError::not_found()),
    }
}

/// `GET /csrf`
pub async fn get_csrf_token(State(state): State<Arc<ExplorerState>>) -> HttpResult<CsrfTokenView> {
    match &state.csrf {
        Some(store) => Ok(Json(CsrfTokenView { csrf_token: store.issue() })),
        None => Err(HttpError::not_found()),
    }
}
