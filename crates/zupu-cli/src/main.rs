//! `zupu`: command-line client for the zupu family register.
//!
//! # Usage
//!
//! ```
//! zupu --url http://localhost:8080 login --email me@example.com
//! zupu members list --search 张
//! zupu relationships add 1 2 --kind parent
//! zupu --config ~/.config/zupu/config.toml stats
//! ```

mod client;
mod render;
mod settings;

use std::{collections::HashMap, io::Write as _, path::PathBuf};

use anyhow::{Context, Result, bail};
use chrono::NaiveDate;
use clap::{Args as ClapArgs, Parser, Subcommand, ValueEnum};
use client::ApiClient;
use settings::{ConfigFile, DEFAULT_URL, SessionFile, default_session_file};
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;
use uuid::Uuid;
use zupu_core::{
  account::{Role, SignUp},
  event::{EventPatch, NewEvent},
  individual::{IndividualPatch, NewIndividual, Sex},
  relationship::{NewRelationship, RelationshipKind},
  session::{SessionContext, SignInOutcome},
  store::{DirectoryStore, IdentityStore, IndividualOrder, IndividualQuery, RelationshipQuery},
  validate::{Validation, validate_new_relationship},
};

// ─── CLI args ─────────────────────────────────────────────────────────────────

#[derive(Parser, Debug)]
#[command(name = "zupu", version, about = "Command-line client for the zupu family register")]
struct Args {
  /// Path to a TOML config file (url, session_file).
  #[arg(short, long, value_name = "FILE")]
  config: Option<PathBuf>,

  /// Base URL of the zupu server (default: http://localhost:8080).
  #[arg(long, env = "ZUPU_URL")]
  url: Option<String>,

  #[command(subcommand)]
  command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
  /// Register a new account.
  Signup(CredentialArgs),
  /// Confirm an account with the token issued at sign-up.
  Confirm { token: String },
  /// Sign in and save the session.
  Login(CredentialArgs),
  /// Sign out and forget the saved session.
  Logout,
  /// Show the signed-in account.
  Whoami,
  /// Family members.
  #[command(subcommand)]
  Members(MembersCommand),
  /// Parent and spouse links between members.
  #[command(subcommand)]
  Relationships(RelationshipsCommand),
  /// The family event timeline.
  #[command(subcommand)]
  Events(EventsCommand),
  /// Aggregate statistics.
  Stats,
  /// The family tree as a list of links.
  Tree {
    /// Only members of this surname.
    #[arg(long)]
    family: Option<String>,
  },
  /// List surnames, or the members of one.
  Branches { surname: Option<String> },
  /// Administration.
  #[command(subcommand)]
  Admin(AdminCommand),
}

#[derive(ClapArgs, Debug)]
struct CredentialArgs {
  #[arg(long)]
  email:    String,
  /// Prompted for when omitted.
  #[arg(long, env = "ZUPU_PASSWORD", hide_env_values = true)]
  password: Option<String>,
}

#[derive(Subcommand, Debug)]
enum MembersCommand {
  List {
    /// Substring of the full name.
    #[arg(long)]
    search: Option<String>,
    #[arg(long, value_enum, default_value_t = Order::Name)]
    order:  Order,
  },
  /// A member with their parents, spouses and children.
  Show { id: i64 },
  Add(MemberFields),
  Edit {
    id:         i64,
    #[command(flatten)]
    fields:     MemberEdit,
  },
  Delete { id: i64 },
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum Order {
  Name,
  Created,
  CreatedDesc,
}

impl From<Order> for IndividualOrder {
  fn from(order: Order) -> Self {
    match order {
      Order::Name => Self::Name,
      Order::Created => Self::CreatedAsc,
      Order::CreatedDesc => Self::CreatedDesc,
    }
  }
}

#[derive(ClapArgs, Debug)]
struct MemberFields {
  #[arg(long)]
  name:      String,
  /// male/female, or 男/女.
  #[arg(long)]
  sex:       String,
  /// YYYY-MM-DD
  #[arg(long)]
  born:      NaiveDate,
  #[arg(long)]
  place:     String,
  #[arg(long)]
  died:      Option<NaiveDate>,
  #[arg(long)]
  residence: Option<String>,
  #[arg(long)]
  bio:       Option<String>,
  #[arg(long)]
  photo:     Option<String>,
}

#[derive(ClapArgs, Debug)]
struct MemberEdit {
  #[arg(long)]
  name:       Option<String>,
  #[arg(long)]
  sex:        Option<String>,
  #[arg(long)]
  born:       Option<NaiveDate>,
  #[arg(long)]
  place:      Option<String>,
  #[arg(long, conflicts_with = "living")]
  died:       Option<NaiveDate>,
  /// Clear the date of death.
  #[arg(long)]
  living:     bool,
  /// An empty value clears the residence.
  #[arg(long)]
  residence:  Option<String>,
  #[arg(long)]
  bio:        Option<String>,
  #[arg(long)]
  photo:      Option<String>,
}

impl MemberEdit {
  fn into_patch(self) -> IndividualPatch {
    IndividualPatch {
      full_name:   self.name,
      sex:         self.sex.as_deref().map(Sex::parse),
      birth_date:  self.born,
      death_date:  if self.living { Some(None) } else { self.died.map(Some) },
      birth_place: self.place,
      residence:   self.residence.map(Some),
      biography:   self.bio.map(Some),
      photo_url:   self.photo.map(Some),
    }
  }
}

#[derive(Subcommand, Debug)]
enum RelationshipsCommand {
  List,
  /// Link two members. For `parent`, A is the parent of B.
  Add {
    person_a: i64,
    person_b: i64,
    #[arg(long, value_enum)]
    kind:     Kind,
  },
  Delete { id: i64 },
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum Kind {
  Parent,
  Spouse,
}

impl From<Kind> for RelationshipKind {
  fn from(kind: Kind) -> Self {
    match kind {
      Kind::Parent => Self::Parent,
      Kind::Spouse => Self::Spouse,
    }
  }
}

#[derive(Subcommand, Debug)]
enum EventsCommand {
  List,
  Add {
    #[arg(long)]
    title:       String,
    #[arg(long)]
    date:        NaiveDate,
    #[arg(long)]
    description: String,
  },
  Edit {
    id:          i64,
    #[arg(long)]
    title:       Option<String>,
    #[arg(long)]
    date:        Option<NaiveDate>,
    #[arg(long)]
    description: Option<String>,
  },
  Delete { id: i64 },
}

#[derive(Subcommand, Debug)]
enum AdminCommand {
  /// Accounts and their roles.
  Users,
  /// Change an account's role.
  Role {
    account_id: Uuid,
    #[arg(value_parser = parse_role)]
    role:       Role,
  },
  /// The audit trail, newest first.
  Logs {
    /// e.g. CREATE_INDIVIDUAL
    #[arg(long)]
    action: Option<String>,
    #[arg(long, default_value_t = 1)]
    page:   usize,
  },
}

fn parse_role(s: &str) -> Result<Role, String> {
  s.parse().map_err(|_| format!("unknown role {s:?}, expected ADMIN or USER"))
}

// ─── Entry point ──────────────────────────────────────────────────────────────

#[tokio::main]
async fn main() -> Result<()> {
  tracing_subscriber::fmt()
    .with_env_filter(
      EnvFilter::builder()
        .with_default_directive(LevelFilter::WARN.into())
        .from_env_lossy(),
    )
    .with_writer(std::io::stderr)
    .init();

  let args = Args::parse();

  let file_cfg = match &args.config {
    Some(path) => ConfigFile::load(path)?,
    None => ConfigFile::default(),
  };

  // CLI flags override config file, which overrides defaults.
  let base_url = args
    .url
    .or_else(|| (!file_cfg.url.is_empty()).then(|| file_cfg.url.clone()))
    .unwrap_or_else(|| DEFAULT_URL.to_string());
  let session_file = SessionFile::new(file_cfg.session_file.unwrap_or_else(default_session_file));

  tracing::debug!(%base_url, session_file = %session_file.path().display(), "client settings");
  let client = ApiClient::new(base_url).context("failed to build HTTP client")?;
  let mut ctx = SessionContext::new(client);
  let saved = session_file.load()?;
  ctx
    .initialize(saved.as_deref())
    .await
    .context("failed to restore session")?;
  if saved.is_some() && !ctx.is_signed_in() {
    session_file.clear()?;
  }

  run(args.command, &mut ctx, &session_file).await
}

async fn run(
  command: Command,
  ctx: &mut SessionContext<ApiClient>,
  session_file: &SessionFile,
) -> Result<()> {
  match command {
    Command::Signup(creds) => {
      let password = password_or_prompt(creds.password)?;
      match ctx.identity().sign_up(&creds.email, &password).await? {
        SignUp::PendingVerification { account_id, .. } => {
          println!("account {account_id} created");
          println!("sign in with `zupu login --email {}`", creds.email);
        }
        SignUp::EmailTaken => bail!("{} is already registered", creds.email),
      }
    }
    Command::Confirm { token } => {
      if !ctx.identity().confirm_email(token.trim()).await? {
        bail!("unknown verification token");
      }
      println!("account confirmed");
    }
    Command::Login(creds) => {
      let password = password_or_prompt(creds.password)?;
      match ctx.sign_in(&creds.email, &password).await? {
        SignInOutcome::SignedIn => {
          if let Some(token) = ctx.token() {
            session_file.save(token)?;
          }
          println!("signed in as {}", creds.email);
        }
        SignInOutcome::InvalidCredentials => bail!("invalid e-mail or password"),
        SignInOutcome::EmailNotConfirmed => {
          bail!("e-mail address not confirmed; run `zupu confirm <token>` first")
        }
      }
    }
    Command::Logout => {
      let result = ctx.sign_out().await;
      session_file.clear()?;
      result.context("server rejected sign-out")?;
      println!("signed out");
    }
    Command::Whoami => {
      let session = ctx.require_session()?;
      let role = ctx.profile().map_or(Role::User, |p| p.role);
      println!("{} ({role})", session.email);
      println!("account:  {}", session.account_id);
      println!("expires:  {}", session.expires_at.format("%Y-%m-%d %H:%M"));
    }
    Command::Members(cmd) => members(cmd, ctx).await?,
    Command::Relationships(cmd) => relationships(cmd, ctx).await?,
    Command::Events(cmd) => events(cmd, ctx).await?,
    Command::Stats => {
      ctx.require_session()?;
      println!("{}", render::stats(&ctx.identity().stats().await?));
    }
    Command::Tree { family } => {
      ctx.require_session()?;
      println!("{}", render::tree(&ctx.identity().tree(family.as_deref()).await?));
    }
    Command::Branches { surname } => {
      ctx.require_session()?;
      match surname {
        Some(surname) => {
          println!("{}", render::individuals(&ctx.identity().branch(&surname).await?));
        }
        None => {
          for surname in ctx.identity().branches().await? {
            println!("{surname}");
          }
        }
      }
    }
    Command::Admin(cmd) => admin(cmd, ctx).await?,
  }
  Ok(())
}

async fn members(cmd: MembersCommand, ctx: &SessionContext<ApiClient>) -> Result<()> {
  let api = ctx.identity();
  match cmd {
    MembersCommand::List { search, order } => {
      ctx.require_session()?;
      let query = IndividualQuery { name_contains: search, order: order.into(), ..Default::default() };
      println!("{}", render::individuals(&api.list_individuals(&query).await?));
    }
    MembersCommand::Show { id } => {
      ctx.require_session()?;
      let view = api.family(id).await?.with_context(|| format!("member {id} not found"))?;
      println!("{}", render::family(&view));
    }
    MembersCommand::Add(f) => {
      ctx.require_admin()?;
      let input = NewIndividual {
        full_name:   f.name,
        sex:         Sex::parse(&f.sex),
        birth_date:  f.born,
        death_date:  f.died,
        birth_place: f.place,
        residence:   f.residence,
        biography:   f.bio,
        photo_url:   f.photo,
      }
      .normalized()?;
      let created = api.create_individual(input).await?;
      println!("{}", render::individual(&created));
    }
    MembersCommand::Edit { id, fields } => {
      ctx.require_admin()?;
      let patch = fields.into_patch().normalized()?;
      if patch.is_empty() {
        bail!("nothing to change");
      }
      let updated = api
        .update_individual(id, patch)
        .await?
        .with_context(|| format!("member {id} not found"))?;
      println!("{}", render::individual(&updated));
    }
    MembersCommand::Delete { id } => {
      ctx.require_admin()?;
      if !api.delete_individual(id).await? {
        bail!("member {id} not found");
      }
      println!("member {id} deleted");
    }
  }
  Ok(())
}

async fn relationships(cmd: RelationshipsCommand, ctx: &SessionContext<ApiClient>) -> Result<()> {
  let api = ctx.identity();
  match cmd {
    RelationshipsCommand::List => {
      ctx.require_session()?;
      println!("{}", render::relationships(&api.described_relationships().await?));
    }
    RelationshipsCommand::Add { person_a, person_b, kind } => {
      ctx.require_admin()?;
      let kind = RelationshipKind::from(kind);

      let people: HashMap<_, _> = api
        .list_individuals(&IndividualQuery::by_ids([person_a, person_b]))
        .await?
        .into_iter()
        .map(|p| (p.id, p))
        .collect();
      for id in [person_a, person_b] {
        if !people.contains_key(&id) {
          bail!("member {id} not found");
        }
      }
      let existing = api
        .list_relationships(&RelationshipQuery { involving: Some(person_a), newest_first: false })
        .await?;
      if let Validation::Rejected(reason) =
        validate_new_relationship(person_a, person_b, &kind, &existing, &people)
      {
        bail!("{reason} ({})", reason.code());
      }

      let created = api
        .create_relationship(NewRelationship { person_a_id: person_a, person_b_id: person_b, kind })
        .await?;
      println!("relationship {} created", created.id);
    }
    RelationshipsCommand::Delete { id } => {
      ctx.require_admin()?;
      if !api.delete_relationship(id).await? {
        bail!("relationship {id} not found");
      }
      println!("relationship {id} deleted");
    }
  }
  Ok(())
}

async fn events(cmd: EventsCommand, ctx: &SessionContext<ApiClient>) -> Result<()> {
  let api = ctx.identity();
  match cmd {
    EventsCommand::List => {
      ctx.require_session()?;
      println!("{}", render::events(&api.list_events().await?));
    }
    EventsCommand::Add { title, date, description } => {
      ctx.require_admin()?;
      let created = api.create_event(NewEvent { title, date, description }.normalized()?).await?;
      println!("event {} created", created.id);
    }
    EventsCommand::Edit { id, title, date, description } => {
      ctx.require_admin()?;
      let patch = EventPatch { title, date, description }.normalized()?;
      let updated = api
        .update_event(id, patch)
        .await?
        .with_context(|| format!("event {id} not found"))?;
      println!("{}", render::events(std::slice::from_ref(&updated)));
    }
    EventsCommand::Delete { id } => {
      ctx.require_admin()?;
      if !api.delete_event(id).await? {
        bail!("event {id} not found");
      }
      println!("event {id} deleted");
    }
  }
  Ok(())
}

async fn admin(cmd: AdminCommand, ctx: &mut SessionContext<ApiClient>) -> Result<()> {
  ctx.require_admin()?;
  match cmd {
    AdminCommand::Users => {
      println!("{}", render::accounts(&ctx.identity().list_accounts().await?));
    }
    AdminCommand::Role { account_id, role } => {
      let profile = ctx
        .identity()
        .update_role(account_id, role)
        .await?
        .with_context(|| format!("account {account_id} not found"))?;
      println!("{} is now {}", profile.account_id, profile.role);
      // Our own role may have changed.
      ctx.refresh_profile().await?;
    }
    AdminCommand::Logs { action, page } => {
      let page = ctx.identity().audit_log(action.as_deref(), page.max(1)).await?;
      println!("{}", render::log_page(&page));
    }
  }
  Ok(())
}

/// Read a password from stdin when it was not given on the command line.
fn password_or_prompt(password: Option<String>) -> Result<String> {
  if let Some(password) = password {
    return Ok(password);
  }
  print!("Password: ");
  std::io::stdout().flush().ok();
  let mut line = String::new();
  std::io::stdin().read_line(&mut line).context("reading password")?;
  Ok(line.trim_end_matches(['\n', '\r']).to_string())
}
