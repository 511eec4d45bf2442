//! Valentine proposal bot: Telegram front end, approver relay and lookup API
//!
//! (c) Softlandia 2025

use valentine_proposal_bot::api;
use valentine_proposal_bot::config::AppConfig;
use valentine_proposal_bot::core::engine::ConversationEngine;
use valentine_proposal_bot::core::gateway::NotificationGateway;
use valentine_proposal_bot::core::links::LinkIssuer;
use valentine_proposal_bot::core::services::{MyPaymentService, MyProposalService};
use valentine_proposal_bot::core::traits::{PaymentService, ProposalService};
use valentine_proposal_bot::infrastructure::admin_chat::AdminChatStore;
use valentine_proposal_bot::infrastructure::database::DatabaseConnection;
use valentine_proposal_bot::infrastructure::repositories::{
    DbPaymentRepository, DbProposalRepository,
};
use valentine_proposal_bot::telegram;
use valentine_proposal_bot::telegram::transport::{
    TelegramApproverGateway, TelegramOwnerNotifier, TelegramPhotoStore,
};

use anyhow::anyhow;
use di::{Injectable, ServiceCollection, ServiceProvider};
use di_axum::RouterServiceProviderExtensions;
use log::{info, warn};
use std::sync::Arc;
use teloxide::Bot;
use tokio::runtime::{Builder, Runtime};

fn main() -> anyhow::Result<()> {
    // initialize tracing
    tracing_subscriber::fmt::init();

    let config = AppConfig::from_env()?;
    let runtime: Runtime = Builder::new_multi_thread().enable_all().build()?;

    runtime.block_on(run(config))
}

fn service_provider() -> anyhow::Result<ServiceProvider> {
    ServiceCollection::new()
        .add(DatabaseConnection::singleton())
        .add(DbProposalRepository::singleton())
        .add(DbPaymentRepository::singleton())
        .add(MyProposalService::singleton())
        .add(MyPaymentService::singleton())
        .build_provider()
        .map_err(|e| anyhow!("invalid service configuration: {e:?}"))
}

async fn run(config: AppConfig) -> anyhow::Result<()> {
    let pool = DatabaseConnection::connect(&config.database_url).await?;
    DatabaseConnection::set_shared_pool(pool);
    tokio::fs::create_dir_all(&config.upload_dir).await?;

    let provider = service_provider()?;
    let payments = provider.get_required::<dyn PaymentService>();
    let proposals = provider.get_required::<dyn ProposalService>();

    let user_bot = Bot::new(&config.bot_token);
    let admin_bot = config.admin_bot_token.as_ref().map(Bot::new);
    if admin_bot.is_none() {
        warn!("ADMIN_BOT_TOKEN not set, payment screenshots cannot be approved");
    }
    let admin_chat = Arc::new(AdminChatStore::load(&config.admin_chat_file).await);

    let gateway = Arc::new(NotificationGateway::new(
        payments.clone(),
        Arc::new(TelegramApproverGateway::new(
            admin_bot.clone(),
            admin_chat.clone(),
            config.payment.clone(),
        )),
        Arc::new(TelegramOwnerNotifier::new(
            user_bot.clone(),
            config.payment.clone(),
        )),
    ));
    let engine = Arc::new(ConversationEngine::new(
        payments.clone(),
        LinkIssuer::new(proposals, payments.clone(), &config.frontend_url),
        gateway.clone(),
        Arc::new(TelegramPhotoStore::new(
            user_bot.clone(),
            &config.upload_dir,
            &config.server_url,
        )),
    ));

    let mut web_task_handle = tokio::spawn(web_server_task(config.clone()));
    let user_task_handle = tokio::spawn(telegram::user::run(
        user_bot,
        engine,
        config.payment.clone(),
    ));
    let admin_task_handle =
        admin_bot.map(|bot| tokio::spawn(telegram::admin::run(bot, gateway, admin_chat)));

    // the bots stop on ctrl-c; the web server only stops on error
    tokio::select! {
        result = &mut web_task_handle => result??,
        result = user_task_handle => result?,
    }
    if let Some(handle) = admin_task_handle {
        handle.await?;
    }
    web_task_handle.abort();

    info!("Shutting down...");
    Ok(())
}

async fn web_server_task(config: AppConfig) -> anyhow::Result<()> {
    let provider = service_provider()?;

    let app = api::router(&config.upload_dir).with_provider(provider);

    // run our app with hyper, listening globally
    let listener = tokio::net::TcpListener::bind(("0.0.0.0", config.port)).await?;
    info!("listening on {}", listener.local_addr()?);
    axum::serve(listener, app).await?;
    Ok(())
}
