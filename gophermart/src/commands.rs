use accrual_tools::AccrualApi;
use gm_common::Secret;
use gophermart_engine::{
    db_types::UserId,
    LedgerApi,
    LedgerStore,
    MemoryDatabase,
    OrderFlowApi,
    ReconciliationApi,
    SqliteDatabase,
    UserApi,
    UserManagement,
};
use log::*;
use serde::Serialize;
use tokio_util::sync::CancellationToken;

use crate::{
    accrual_worker::run_accrual_worker,
    cli::{Command, Credentials},
    config::GophermartConfig,
    dto::{BalanceResponse, OrderResponse, SubmitOrderResponse, UserResponse, WithdrawResponse},
    errors::AppError,
};

/// Opens the configured store and executes `command` against it. Returns the JSON to print, if the command produces
/// any.
pub async fn execute(command: Command, config: &GophermartConfig) -> Result<Option<String>, AppError> {
    match &config.database_url {
        Some(url) => {
            let db = SqliteDatabase::new_with_url(url, config.max_connections).await?;
            execute_with_store(command, db, config).await
        },
        None => {
            if !matches!(command, Command::Run) {
                warn!("🪛️ Running a one-off command against the in-memory store. Nothing will be kept.");
            }
            execute_with_store(command, MemoryDatabase::new(), config).await
        },
    }
}

pub async fn execute_with_store<B>(command: Command, mut db: B, config: &GophermartConfig) -> Result<Option<String>, AppError>
where B: LedgerStore + UserManagement {
    db.ping().await?;
    let result = dispatch(command, db.clone(), config).await;
    if let Err(e) = db.close().await {
        warn!("🗃️ Could not close the store cleanly. {e}");
    }
    result
}

async fn dispatch<B>(command: Command, db: B, config: &GophermartConfig) -> Result<Option<String>, AppError>
where B: LedgerStore + UserManagement {
    match command {
        Command::Run => {
            run_worker(db, config).await?;
            Ok(None)
        },
        Command::Register { credentials } => {
            let password = Secret::new(credentials.password);
            let account = UserApi::new(db).register(&credentials.login, &password).await?;
            to_json(&UserResponse::from(&account))
        },
        Command::SubmitOrder { credentials, order } => {
            let user = sign_in(&db, credentials).await?;
            let result = OrderFlowApi::new(db).submit_order(&user, &order).await?;
            to_json(&SubmitOrderResponse::from(&result))
        },
        Command::Orders { credentials } => {
            let user = sign_in(&db, credentials).await?;
            let orders = OrderFlowApi::new(db).orders_for_user(&user).await?;
            to_json(&orders.iter().map(OrderResponse::from).collect::<Vec<_>>())
        },
        Command::Balance { credentials } => {
            let user = sign_in(&db, credentials).await?;
            let balance = LedgerApi::new(db).balance(&user).await?;
            to_json(&BalanceResponse::from(balance))
        },
        Command::Withdrawals { credentials } => {
            let user = sign_in(&db, credentials).await?;
            let withdrawals = LedgerApi::new(db).withdrawals(&user).await?;
            to_json(&withdrawals.iter().map(WithdrawResponse::from).collect::<Vec<_>>())
        },
        Command::Withdraw { credentials, order, sum } => {
            let user = sign_in(&db, credentials).await?;
            let entry = LedgerApi::new(db).withdraw(&user, &order, sum).await?;
            to_json(&WithdrawResponse::from(&entry))
        },
    }
}

/// Checks the credentials and returns the user they belong to.
async fn sign_in<B>(db: &B, credentials: Credentials) -> Result<UserId, AppError>
where B: LedgerStore + UserManagement {
    let password = Secret::new(credentials.password);
    let account = UserApi::new(db.clone()).authenticate(&credentials.login, &password).await?;
    Ok(account.user_id)
}

/// Runs the reconciliation worker until Ctrl-C.
async fn run_worker<B: LedgerStore>(db: B, config: &GophermartConfig) -> Result<(), AppError> {
    let accrual = AccrualApi::new(config.accrual.clone())?;
    let api = ReconciliationApi::new(db, accrual);
    let cancel = CancellationToken::new();
    let token = cancel.clone();
    tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => {
                info!("🕰️ Interrupt received. Shutting down.");
                token.cancel();
            },
            Err(e) => error!("🕰️ Could not listen for the interrupt signal. {e}"),
        }
    });
    run_accrual_worker(&api, &config.worker, &cancel).await;
    Ok(())
}

fn to_json<T: Serialize + ?Sized>(value: &T) -> Result<Option<String>, AppError> {
    Ok(Some(serde_json::to_string_pretty(value)?))
}
