use std::sync::Arc;

use anyhow::Result;
use backend::usecases::{account_provisioner::AccountProvisioner, users::UserUseCase};
use clap::Parser;
use crates::infra::{
    db::{
        postgres::postgres_connection,
        repositories::{lesson_progress::LessonProgressPostgres, users::UserPostgres},
    },
    identity::supabase_auth::SupabaseAuthAdmin,
};
use tracing::{error, info};

/// Creates an admin account, or promotes the account already registered under the email.
#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    email: String,

    password: String,

    #[arg(long, default_value = "Admin")]
    name: String,

    #[arg(long, env = "DATABASE_URL", hide_env_values = true)]
    database_url: String,

    #[arg(long, env = "SUPABASE_PROJECT_URL")]
    supabase_project_url: String,

    #[arg(long, env = "SUPABASE_SERVICE_KEY", hide_env_values = true)]
    supabase_service_key: String,
}

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    if let Err(error) = run(cli).await {
        error!("create-admin failed: {:#}", error);
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<()> {
    crates::observability::init_observability("create-admin")?;

    let db_pool = Arc::new(postgres_connection::establish_connection(&cli.database_url)?);
    let user_repository = Arc::new(UserPostgres::new(Arc::clone(&db_pool)));
    let identity_provider = Arc::new(SupabaseAuthAdmin::new(
        cli.supabase_project_url,
        cli.supabase_service_key,
    ));

    let usecase = UserUseCase::new(
        user_repository.clone(),
        Arc::new(LessonProgressPostgres::new(db_pool)),
        Arc::new(AccountProvisioner::new(user_repository, identity_provider)),
    );

    let admin = usecase.create_admin(&cli.email, &cli.password, &cli.name).await?;
    info!(user_id = %admin.id, email = %admin.email, "create-admin: admin ready");

    Ok(())
}
