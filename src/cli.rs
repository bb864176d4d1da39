//! Command-line interface definition and dispatch.
//!
//! This module uses clap to define the argument surface and maps each
//! subcommand onto the library.

use anyhow::{anyhow, bail};
use clap::{Args, Parser, Subcommand};
use std::collections::BTreeMap;

use crate::auth::{self, AuthenticatedClient};
use crate::company::Company;
use crate::config::ApiConfig;
use crate::jobs::{self, filter_listings, ExperienceRange, FilterSpec, JobBoard, JobListing};
use crate::session::{SessionHandle, SessionStore};
use crate::settings::{self, SettingsUpdate};
use crate::telemetry;

/// Command-line arguments for jobdeck
#[derive(Parser, Debug)]
#[command(
    name = "jobdeck",
    about = "Job listings from the big Korean tech companies, in your terminal",
    version
)]
pub struct Cli {
    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Subcommands for jobdeck
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Log in with a Kakao access token
    Login {
        /// Access token obtained from the Kakao OAuth flow
        #[arg(long)]
        token: String,
    },

    /// Clear the stored session
    Logout,

    /// Show who is logged in
    Whoami,

    /// List job postings for one company
    List {
        /// Company code or subscription key (e.g. NAVER or naver)
        #[arg(value_parser = parse_company)]
        company: Company,

        #[command(flatten)]
        filter: FilterArgs,
    },

    /// Aggregate postings across all subscribed companies
    Feed {
        #[command(flatten)]
        filter: FilterArgs,
    },

    /// Print a posting's detail link and record the click
    Open {
        /// Company the posting belongs to
        #[arg(value_parser = parse_company)]
        company: Company,

        /// Posting id as shown by `list`
        #[arg(long)]
        id: i64,
    },

    /// Show the category taxonomy
    Categories,

    /// Subscription settings
    Settings {
        #[command(subcommand)]
        command: SettingsCommands,
    },
}

/// Settings subcommands
#[derive(Subcommand, Debug)]
pub enum SettingsCommands {
    /// Show the stored settings
    Show,

    /// Replace the stored settings
    Save {
        /// Account email
        #[arg(long)]
        email: String,

        /// Companies to subscribe to, comma separated
        #[arg(long, value_delimiter = ',', value_parser = parse_company)]
        companies: Vec<Company>,

        /// Job roles to follow, comma separated
        #[arg(long, value_delimiter = ',')]
        roles: Vec<String>,

        /// Career years to match, comma separated
        #[arg(long, value_delimiter = ',')]
        career_years: Vec<u32>,
    },
}

/// Filter flags shared by `list` and `feed`
#[derive(Args, Debug, Default)]
pub struct FilterArgs {
    /// Exact employment type (e.g. 정규)
    #[arg(long)]
    employment_type: Option<String>,

    /// Category selection as GROUP=LEAF[,LEAF...], repeatable
    #[arg(long = "category")]
    categories: Vec<String>,

    /// Experience window in years as START..END
    #[arg(long, value_parser = parse_experience)]
    experience: Option<ExperienceRange>,

    /// Also show postings that require no experience
    #[arg(long)]
    include_no_experience: bool,

    /// Case-insensitive text search
    #[arg(long)]
    search: Option<String>,
}

impl FilterArgs {
    fn any(&self) -> bool {
        self.employment_type.is_some()
            || !self.categories.is_empty()
            || self.experience.is_some()
            || self.include_no_experience
            || self.search.is_some()
    }

    fn to_spec(&self) -> anyhow::Result<FilterSpec> {
        let mut categories: BTreeMap<String, Vec<String>> = BTreeMap::new();
        for arg in &self.categories {
            let (group, leaves) = parse_category(arg)?;
            categories.entry(group).or_default().extend(leaves);
        }
        Ok(FilterSpec {
            employment_type: self.employment_type.clone().unwrap_or_default(),
            categories,
            experience_range: self.experience,
            include_no_experience: self.include_no_experience,
            search_query: self.search.clone().unwrap_or_default(),
        })
    }
}

/// Parse a company in either spelling
fn parse_company(arg: &str) -> Result<Company, String> {
    arg.parse().map_err(|err| format!("{err}"))
}

/// Parse an experience window written as START..END
fn parse_experience(arg: &str) -> Result<ExperienceRange, String> {
    let (start, end) = arg
        .split_once("..")
        .ok_or_else(|| format!("expected START..END, got '{arg}'"))?;
    let start = start
        .trim()
        .parse()
        .map_err(|_| format!("'{}' is not a number of years", start.trim()))?;
    let end = end
        .trim()
        .parse()
        .map_err(|_| format!("'{}' is not a number of years", end.trim()))?;
    ExperienceRange::new(start, end).map_err(|err| format!("{err}"))
}

/// Parse one --category argument of the form GROUP=LEAF[,LEAF...]
fn parse_category(arg: &str) -> anyhow::Result<(String, Vec<String>)> {
    let (group, leaves) = arg
        .split_once('=')
        .ok_or_else(|| anyhow!("expected GROUP=LEAF[,LEAF...], got '{arg}'"))?;
    let group = group.trim();
    let leaves: Vec<String> = leaves
        .split(',')
        .map(|leaf| leaf.trim().to_string())
        .filter(|leaf| !leaf.is_empty())
        .collect();
    if group.is_empty() || leaves.is_empty() {
        bail!("expected GROUP=LEAF[,LEAF...], got '{arg}'");
    }
    Ok((group.to_string(), leaves))
}

/// Execute a parsed command.
pub async fn run(cli: Cli) -> anyhow::Result<()> {
    let config = ApiConfig::from_env();
    let session = SessionHandle::new(SessionStore::default_location());

    match cli.command {
        Commands::Login { token } => {
            let user = auth::kakao_login(&config, &session, &token).await?;
            println!("logged in as {} (user {})", user.name, user.user_id);
        }

        Commands::Logout => {
            session.logout();
            println!("session cleared");
        }

        Commands::Whoami => match session.user() {
            Some(user) if session.authenticated() => {
                println!("{} (user {})", user.name, user.user_id);
                if let Some(saved_at) = session.saved_at() {
                    println!("session saved {}", saved_at.format("%Y-%m-%d %H:%M UTC"));
                }
            }
            _ => println!("not logged in"),
        },

        Commands::List { company, filter } => {
            let board = JobBoard::new(config);
            board.select(company);
            if filter.any() {
                board.set_filter(filter.to_spec()?)?;
                if let Some(listings) = board.filtered().await? {
                    print_listings(&listings);
                }
            } else if let Some(listings) = board.listings().await? {
                print_listings(&listings);
            }
        }

        Commands::Feed { filter } => {
            let client = AuthenticatedClient::new(config.clone(), session.clone());
            let spec = filter.to_spec()?;
            let companies = match settings::fetch_settings(&client).await {
                Ok(settings) => settings.subscribed_companies(),
                Err(err) if err.forces_logout() => {
                    bail!("not authenticated ({err}); run `jobdeck login` first")
                }
                Err(err) => return Err(err.into()),
            };
            if companies.is_empty() {
                println!("no subscribed companies; run `jobdeck settings save`");
                return Ok(());
            }

            let board = JobBoard::new(config);
            board.warm(&companies).await;
            for company in companies {
                board.select(company);
                let Some(listings) = board.listings().await? else {
                    continue;
                };
                let kept = filter_listings(&listings, &spec);
                println!("== {} ({}) ==", company.label(), kept.len());
                print_listings(&kept);
            }
        }

        Commands::Open { company, id } => {
            let board = JobBoard::new(config.clone());
            board.select(company);
            let listings = board.listings().await?.unwrap_or_default();
            let Some(listing) = listings.into_iter().find(|l| l.id == Some(id)) else {
                bail!("no posting with id {id} for {company}");
            };
            println!("{}", listing.detail_link);
            // best effort; the beacon must never block browsing
            let _ = telemetry::record_click(&config, &listing).await;
        }

        Commands::Categories => {
            let groups = jobs::fetch_categories(&config).await?;
            if groups.is_empty() {
                println!("no categories available");
            }
            for group in groups {
                println!("{}", group.name);
                for leaf in group.leaves {
                    println!("  - {}", leaf.name);
                }
            }
        }

        Commands::Settings { command } => {
            let client = AuthenticatedClient::new(config, session);
            match command {
                SettingsCommands::Show => match settings::fetch_settings(&client).await {
                    Ok(settings) => print_settings(&settings),
                    Err(err) if err.forces_logout() => {
                        bail!("not authenticated ({err}); run `jobdeck login` first")
                    }
                    Err(err) => return Err(err.into()),
                },
                SettingsCommands::Save {
                    email,
                    companies,
                    roles,
                    career_years,
                } => {
                    let update = SettingsUpdate {
                        email,
                        subscribed_services: companies,
                        selected_job_roles: roles,
                        selected_career_years: career_years,
                    };
                    let outcome = settings::save_settings(&client, &update).await?;
                    if outcome.success {
                        println!("settings saved");
                    } else {
                        bail!("the server rejected the settings");
                    }
                }
            }
        }
    }

    Ok(())
}

fn print_listings(listings: &[JobListing]) {
    for listing in listings {
        let experience = match (listing.experience_min, listing.effective_max()) {
            (0, _) => "경력무관".to_string(),
            (min, None) => format!("{min}년+"),
            (min, Some(max)) if min == max => format!("{min}년"),
            (min, Some(max)) => format!("{min}~{max}년"),
        };
        let company = listing
            .company_display_name
            .as_deref()
            .unwrap_or(listing.company_code.as_str());
        let id = listing
            .id
            .map(|id| id.to_string())
            .unwrap_or_else(|| "-".to_string());
        println!(
            "[{id}] {} | {} | {} | {experience}",
            listing.subject, company, listing.sub_job_name
        );
        if let Some(end_date) = &listing.end_date {
            println!("      마감 {end_date} | {}", listing.detail_link);
        } else {
            println!("      상시 | {}", listing.detail_link);
        }
    }
}

fn print_settings(settings: &crate::settings::UserSettings) {
    println!("email: {}", settings.user_info.email);
    let companies = settings.subscribed_companies();
    if companies.is_empty() {
        println!("subscriptions: none");
    } else {
        let labels: Vec<&str> = companies.iter().map(|c| c.label()).collect();
        println!("subscriptions: {}", labels.join(", "));
    }
    if !settings.selected_job_roles.is_empty() {
        println!("roles: {}", settings.selected_job_roles.join(", "));
    }
    if let Some(career_year) = settings.career_year {
        println!("career year: {career_year}");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_experience_accepts_a_window() {
        assert_eq!(
            parse_experience("2..5"),
            Ok(ExperienceRange { start: 2, end: 5 })
        );
        assert_eq!(
            parse_experience(" 0 .. 10 "),
            Ok(ExperienceRange { start: 0, end: 10 })
        );
    }

    #[test]
    fn test_parse_experience_rejects_bad_input() {
        assert!(parse_experience("5").is_err());
        assert!(parse_experience("a..b").is_err());
        assert!(parse_experience("5..2").is_err());
    }

    #[test]
    fn test_parse_category_splits_group_and_leaves() {
        let (group, leaves) = parse_category("개발=Backend,Frontend").unwrap();
        assert_eq!(group, "개발");
        assert_eq!(leaves, vec!["Backend", "Frontend"]);
    }

    #[test]
    fn test_parse_category_rejects_malformed_input() {
        assert!(parse_category("no-equals-sign").is_err());
        assert!(parse_category("=Backend").is_err());
        assert!(parse_category("개발=").is_err());
    }

    #[test]
    fn test_filter_args_translate_into_a_spec() {
        let args = FilterArgs {
            employment_type: Some("정규".to_string()),
            categories: vec!["개발=Backend".to_string(), "개발=ML".to_string()],
            experience: Some(ExperienceRange { start: 2, end: 5 }),
            include_no_experience: true,
            search: Some("서버".to_string()),
        };

        let spec = args.to_spec().unwrap();
        assert_eq!(spec.employment_type, "정규");
        assert_eq!(spec.categories["개발"], vec!["Backend", "ML"]);
        assert_eq!(spec.experience_range, Some(ExperienceRange { start: 2, end: 5 }));
        assert!(spec.include_no_experience);
        assert_eq!(spec.search_query, "서버");
    }

    #[test]
    fn test_empty_filter_args_are_a_wildcard_spec() {
        let args = FilterArgs::default();
        assert!(!args.any());
        assert_eq!(args.to_spec().unwrap(), FilterSpec::default());
    }

    #[test]
    fn test_cli_parses_a_full_command_line() {
        let cli = Cli::try_parse_from([
            "jobdeck",
            "list",
            "naver",
            "--employment-type",
            "정규",
            "--category",
            "개발=Backend,Frontend",
            "--experience",
            "2..5",
            "--include-no-experience",
            "--search",
            "서버",
        ])
        .unwrap();

        let Commands::List { company, filter } = cli.command else {
            panic!("expected the list command");
        };
        assert_eq!(company, Company::Naver);
        assert!(filter.any());
        let spec = filter.to_spec().unwrap();
        assert_eq!(spec.experience_range, Some(ExperienceRange { start: 2, end: 5 }));
    }
}
