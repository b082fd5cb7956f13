use anyhow::{anyhow, Result};
use clap::{Parser, Subcommand};
use tracing::Instrument;

use buildbridge::contracts::{Contract, ContractNegotiation, ContractStatus, SignedDocument, SignedUploadFlow};
use buildbridge::registration::{required_fields, steps_for};
use buildbridge::workflows::{OfferStatus, ProjectContext, ProjectStatus, WorkflowOrchestrator};
use buildbridge::{
    create_workflow_span, generate_correlation_id, init_telemetry, shutdown_telemetry, BuildBridgeConfig,
    MockBackend, PartyRole, Role,
};

#[derive(Parser)]
#[command(name = "buildbridge")]
#[command(about = "Contract negotiation, onboarding and project workflow tooling")]
#[command(long_about = "BuildBridge models the onboarding steps for each participant role, \
                       the contract negotiation state machine between client and contractor, \
                       and the project workflow stages shown in the UI.")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List registration roles and their step counts
    Roles,
    /// Show the onboarding steps for a role
    Steps {
        /// Role key, e.g. supplier or engineering_office
        #[arg(long)]
        role: Role,
    },
    /// Derive the workflow stage and route for a project
    Stage {
        /// Project status: draft, published, in_progress, completed, cancelled
        #[arg(long)]
        project: ProjectStatus,
        /// Status of the most relevant offer
        #[arg(long)]
        offer: Option<OfferStatus>,
        /// Contract status label or snake_case key
        #[arg(long)]
        contract: Option<ContractStatus>,
        /// Number of pending offers
        #[arg(long, default_value = "0")]
        offers: u32,
        /// Who is looking: client or contractor
        #[arg(long, default_value = "client")]
        viewer: PartyRole,
        #[arg(long, default_value = "demo-project")]
        project_id: String,
        #[arg(long)]
        contract_id: Option<String>,
    },
    /// Run a scripted negotiation against the in-memory backend
    Negotiate,
    /// Print the effective configuration
    Config,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = match buildbridge::config() {
        Ok(config) => config.clone(),
        Err(e) => {
            eprintln!("⚠️  Falling back to default configuration: {e}");
            BuildBridgeConfig::default()
        }
    };
    init_telemetry(&config.observability)?;

    let result = match cli.command {
        Commands::Roles => {
            list_roles();
            Ok(())
        }
        Commands::Steps { role } => {
            show_steps(role);
            Ok(())
        }
        Commands::Stage {
            project,
            offer,
            contract,
            offers,
            viewer,
            project_id,
            contract_id,
        } => show_stage(project, offer, contract, offers, viewer, project_id, contract_id),
        Commands::Negotiate => {
            let correlation_id = generate_correlation_id();
            let span = create_workflow_span("negotiate", Some("demo-project"), None, Some(&correlation_id));
            tokio::runtime::Runtime::new()?.block_on(run_negotiation(&config).instrument(span))
        }
        Commands::Config => {
            println!("{}", toml::to_string_pretty(&config)?);
            Ok(())
        }
    };

    shutdown_telemetry();
    result
}

fn list_roles() {
    println!("📋 Registration roles");
    for role in Role::ALL {
        println!("  {:<20} {} steps", role.key(), steps_for(role).len());
    }
}

fn show_steps(role: Role) {
    println!("🧭 {} onboarding", role.label());
    for (i, step) in steps_for(role).iter().enumerate() {
        let fields = required_fields(role, *step);
        if fields.is_empty() {
            println!("  {}. {}", i + 1, step.title());
        } else {
            println!("  {}. {} ({})", i + 1, step.title(), fields.join(", "));
        }
    }
}

fn show_stage(
    project: ProjectStatus,
    offer: Option<OfferStatus>,
    contract: Option<ContractStatus>,
    offers: u32,
    viewer: PartyRole,
    project_id: String,
    contract_id: Option<String>,
) -> Result<()> {
    let mut ctx = ProjectContext::new(project_id, project);
    ctx.offer_status = offer;
    ctx.pending_offers = offers;
    ctx.contract_status = contract;
    ctx.contract_id = contract_id.or_else(|| contract.map(|_| "demo-contract".to_string()));

    let snapshot = WorkflowOrchestrator::new(viewer).snapshot(&ctx);
    println!("{}", serde_json::to_string_pretty(&snapshot)?);
    Ok(())
}

async fn run_negotiation(config: &BuildBridgeConfig) -> Result<()> {
    let backend = MockBackend::from_config(config);
    let contract = Contract::seed("demo-project");

    backend.insert_contract(contract.clone()).await;
    let mut store = ContractNegotiation::new(contract, PartyRole::Client)
        .with_document_base_url(config.signing.document_base_url.clone());

    println!("📄 {} ({})", store.contract().title, store.contract().id);
    print_status(&store);

    store.add_clause("Working hours are limited to 7am-6pm on weekdays")?;
    store.send_to_other_party(Some("Added working hours clause".to_string()))?;
    print_status(&store);

    store.set_role(PartyRole::Contractor);
    store.request_changes("Please allow Saturday work during the concrete phase")?;
    print_status(&store);

    store.set_role(PartyRole::Client);
    if let Some(clause) = store.contract().additional_clauses.first().cloned() {
        store.update_clause(&clause.id, "Working hours are 7am-6pm, Saturdays allowed during concrete works")?;
    }
    store.send_to_other_party(Some("Saturday work allowed".to_string()))?;
    print_status(&store);

    store.set_role(PartyRole::Contractor);
    store.approve(Some("Agreed".to_string()))?;
    print_status(&store);

    // Client signs through the OTP upload flow
    store.set_role(PartyRole::Client);
    let mut upload = SignedUploadFlow::new(store.contract().id.clone(), PartyRole::Client, config.otp.resend_cooldown());
    let ticket_id = upload.request_otp(&backend).await?.ticket_id.clone();
    let code = backend
        .delivered_code(&ticket_id)
        .await
        .ok_or_else(|| anyhow!("no code delivered for ticket {ticket_id}"))?;
    println!("  📱 code delivered to {}", upload.ticket().map(|t| t.destination.as_str()).unwrap_or("?"));
    let document = SignedDocument::pdf("contract-client-signed.pdf", b"%PDF-1.7\n% signed by client\n".to_vec());
    let receipt = upload.verify_and_upload(&backend, &code, &document).await?;
    store.apply_signed_upload(&receipt)?;
    print_status(&store);

    store.set_role(PartyRole::Contractor);
    store.sign()?;
    print_status(&store);

    store.save(&backend).await?;
    println!("✅ Contract saved at version {}", store.contract().version_number);
    println!("{}", serde_json::to_string_pretty(&store.contract().version_history)?);
    Ok(())
}

fn print_status(store: &ContractNegotiation) {
    let contract = store.contract();
    println!(
        "  v{:<2} {:<32} last comment: {}",
        contract.version_number,
        contract.status.label(),
        contract.last_negotiation_comment.as_deref().unwrap_or("-")
    );
}
