//! Subcommands and their dispatch.

use clap::Subcommand;
use color_eyre::{eyre::eyre, Result};
use std::time::Duration;

use crate::output;
use mpadmin::api::{
  Company, ListParams, LoginCredentials, Professional, ResourceKind, ServiceRequest, User,
  VerificationUpdate, DEFAULT_PAGE,
};
use mpadmin::cache::{StatusUpdate, VerificationCommand};
use mpadmin::config::Config;
use mpadmin::context::AdminContext;

#[derive(Subcommand, Debug)]
pub enum Command {
  /// Log in as an admin and store the session token
  Login {
    #[arg(short, long)]
    email: String,
    /// Password, read from MPADMIN_PASSWORD when omitted
    #[arg(short, long, env = "MPADMIN_PASSWORD", hide_env_values = true)]
    password: Option<String>,
  },
  /// Forget the stored token
  Logout,
  /// Show the signed-in admin
  Whoami,
  /// Show dashboard statistics
  Dashboard,
  /// Keep the dashboard on screen, refreshing in the background
  Watch {
    /// Seconds between refreshes
    #[arg(short, long, default_value_t = 30)]
    interval: u64,
    /// Stop after this many refreshes
    #[arg(short, long)]
    count: Option<u32>,
  },
  /// List a resource page by page
  List {
    #[arg(value_parser = parse_kind)]
    resource: ResourceKind,
    #[arg(short, long, default_value_t = DEFAULT_PAGE)]
    page: u32,
    /// Page size (defaults to page_size from the config)
    #[arg(short, long)]
    limit: Option<u32>,
    /// Only records with this status
    #[arg(short, long)]
    status: Option<String>,
  },
  /// Show one record
  Show {
    #[arg(value_parser = parse_kind)]
    resource: ResourceKind,
    id: String,
  },
  /// Change the status of one record
  SetStatus {
    #[arg(value_parser = parse_kind)]
    resource: ResourceKind,
    id: String,
    status: String,
  },
  /// Set a user's email/phone verification flags
  Verify {
    id: String,
    #[arg(long)]
    email_verified: Option<bool>,
    #[arg(long)]
    phone_verified: Option<bool>,
  },
}

fn parse_kind(s: &str) -> std::result::Result<ResourceKind, String> {
  s.parse().map_err(|e: mpadmin::error::ApiError| e.to_string())
}

pub async fn run(command: Command, ctx: &AdminContext) -> Result<()> {
  match command {
    Command::Login { email, password } => {
      let password = match password {
        Some(p) => p,
        None => Config::get_password()?,
      };
      let identity = ctx
        .session
        .login(&LoginCredentials { email, password })
        .await?;
      print!("Logged in as {}", output::identity(&identity));
    }
    Command::Logout => {
      ctx.reset()?;
      println!("Logged out.");
    }
    Command::Whoami => {
      let identity = require_admin(ctx).await?;
      print!("{}", output::identity(&identity));
    }
    Command::Dashboard => {
      require_admin(ctx).await?;
      let result = ctx.admin.dashboard_stats().await?;
      print!("{}", output::dashboard(&result.data));
      print!("{}", output::source_note(&result));
    }
    Command::Watch { interval, count } => {
      require_admin(ctx).await?;
      watch_dashboard(ctx, Duration::from_secs(interval.max(1)), count).await?;
    }
    Command::List {
      resource,
      page,
      limit,
      status,
    } => {
      require_admin(ctx).await?;
      let mut params = ListParams::new(page, limit.unwrap_or(ctx.page_size));
      if let Some(status) = status {
        params = params.with_status(status);
      }
      let out = match resource {
        ResourceKind::Users => output::page(&ctx.admin.list::<User>(resource, &params).await?),
        ResourceKind::Professionals => {
          output::page(&ctx.admin.list::<Professional>(resource, &params).await?)
        }
        ResourceKind::Companies => {
          output::page(&ctx.admin.list::<Company>(resource, &params).await?)
        }
        ResourceKind::Requests => {
          output::page(&ctx.admin.list::<ServiceRequest>(resource, &params).await?)
        }
      };
      print!("{}", out);
    }
    Command::Show { resource, id } => {
      require_admin(ctx).await?;
      let out = match resource {
        ResourceKind::Users => output::record(&ctx.admin.user(&id).await?),
        ResourceKind::Professionals => output::record(&ctx.admin.professional(&id).await?),
        ResourceKind::Companies => output::record(&ctx.admin.company(&id).await?),
        ResourceKind::Requests => output::record(&ctx.admin.request(&id).await?),
      };
      print!("{}", out);
    }
    Command::SetStatus {
      resource,
      id,
      status,
    } => {
      require_admin(ctx).await?;
      if !resource.known_statuses().contains(&status.as_str()) {
        let hints = get_suggestions(resource, &status);
        if hints.is_empty() {
          eprintln!("warning: {} is not a known {} status", status, resource);
        } else {
          eprintln!(
            "warning: {} is not a known {} status (did you mean {}?)",
            status,
            resource,
            hints.join(", ")
          );
        }
      }
      ctx
        .admin
        .update_status(&StatusUpdate::new(resource, &id, &status))
        .await?;
      println!("Updated {} {} to {}", resource, id, status);
    }
    Command::Verify {
      id,
      email_verified,
      phone_verified,
    } => {
      require_admin(ctx).await?;
      let update = VerificationUpdate {
        email_verified,
        phone_verified,
      };
      if update.is_empty() {
        return Err(eyre!("Nothing to change. Pass --email-verified and/or --phone-verified."));
      }
      let user = ctx
        .admin
        .update_user_verification(&VerificationCommand { id, update })
        .await?;
      println!(
        "Updated {}: email verified {}, phone verified {}",
        user.email,
        user.email_verified.unwrap_or_default(),
        user.phone_verified.unwrap_or_default()
      );
    }
  }

  Ok(())
}

async fn require_admin(ctx: &AdminContext) -> Result<mpadmin::api::Identity> {
  ctx.session.restore().await?;
  ctx
    .session
    .require_admin()
    .map_err(|_| eyre!("Not logged in as an admin. Run `mpadmin login --email <EMAIL>` first."))
}

/// Redraw the dashboard each time the polling query settles, until the
/// count is reached, the session ends or the user interrupts.
async fn watch_dashboard(ctx: &AdminContext, interval: Duration, count: Option<u32>) -> Result<()> {
  let mut query = ctx.admin.dashboard_query(interval);
  let mut session = ctx.session.subscribe();
  let mut ticker = tokio::time::interval(Duration::from_millis(200));
  let ctrl_c = tokio::signal::ctrl_c();
  tokio::pin!(ctrl_c);

  let mut shown = 0;
  query.fetch();
  loop {
    tokio::select! {
      _ = ticker.tick() => {
        query.tick();
        if !query.poll() {
          continue;
        }
        if let Some(stats) = query.data() {
          if let Some(at) = query.fetched_at() {
            println!("Dashboard at {}", at.format("%Y-%m-%d %H:%M:%S UTC"));
          }
          print!("{}", output::dashboard(stats));
        }
        if let Some(error) = query.error() {
          eprintln!("refresh failed: {}", error);
        }
        println!();
        shown += 1;
        if count.is_some_and(|c| shown >= c) {
          break;
        }
      }
      changed = session.changed() => {
        if changed.is_err() || !session.borrow().is_authenticated() {
          return Err(eyre!("Session expired. Run `mpadmin login` again."));
        }
      }
      _ = &mut ctrl_c => break,
    }
  }

  Ok(())
}

/// Known statuses of a resource that resemble the input, best first.
pub fn get_suggestions(kind: ResourceKind, input: &str) -> Vec<&'static str> {
  let input_upper = input.trim().to_uppercase();
  if input_upper.is_empty() {
    return kind.known_statuses().to_vec();
  }

  let mut matches: Vec<(&'static str, u32)> = Vec::new();
  for &status in kind.known_statuses() {
    // Exact match, ignoring case
    if status == input_upper {
      matches.push((status, 0));
      continue;
    }

    // Prefix match
    if status.starts_with(&input_upper) {
      matches.push((status, 1));
      continue;
    }

    // Fuzzy match (contains)
    if status.contains(&input_upper) {
      matches.push((status, 2));
    }
  }

  matches.sort_by_key(|(_, priority)| *priority);
  matches.into_iter().map(|(status, _)| status).collect()
}
