//! Command parsing and execution.

use anyhow::{anyhow, bail, Context, Result};
use chrono::{NaiveDate, NaiveTime, Utc};
use parkflow_core::api::ApiClient;
use parkflow_core::auth::TokenStatus;
use parkflow_core::config::Config;
use parkflow_core::loader::load_dashboard;
use parkflow_core::models::{
    format_duration, EntityId, MinorUnits, NewReservation, Occupancy, RegisterRequest,
    DEFAULT_CURRENCY, DEFAULT_PAYMENT_METHOD, PAYMENT_METHODS,
};
use parkflow_core::utils::{
    is_valid_email, parse_major, truncate_string, validate_password, validate_plate,
};
use tracing::debug;

use crate::prompt;

pub const USAGE: &str = "\
Usage: parkflow <command> [args]

Account:
  login [email]                      Sign in (password is prompted)
  logout                             Sign out
  status                             Show the stored session
  register                           Create an account
  verify <token>                     Confirm an email address
  resend-verification <email>        Send the confirmation email again
  profile                            Show your profile

Driving:
  dashboard                          Wallet, active reservations, vehicles
  wallet                             Show the wallet balance
  topup <amount> [method]            Add funds (method: blik, card, transfer)
  vehicles                           List vehicles
  vehicle-add <plate>                Register a vehicle
  vehicle-update <id> <plate>        Change a vehicle's plate
  vehicle-remove <id>                Remove a vehicle
  reservations                       List reservations
  reserve <parking> <date> <time> [spot]
                                     Book a spot (date YYYY-MM-DD, time HH:MM UTC)
  history                            Past parking sessions
  pay <session>                      Pay for a session

Parking:
  search [location]                  Find parking locations
  parking <id>                       Location details and occupancy

Environment: PARKFLOW_API_URL, PARKFLOW_TOKEN_BACKEND, PARKFLOW_STORE_PASSPHRASE,
PARKFLOW_LOG_FILE, RUST_LOG";

/// Width of the name column in listings
const NAME_WIDTH: usize = 28;

#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    Help,
    Login { email: Option<String> },
    Logout,
    Status,
    Register,
    Verify { token: String },
    ResendVerification { email: String },
    Profile,
    Dashboard,
    Wallet,
    TopUp { amount: MinorUnits, method: String },
    Vehicles,
    VehicleAdd { plate: String },
    VehicleUpdate { id: EntityId, plate: String },
    VehicleRemove { id: EntityId },
    Reservations,
    Reserve(NewReservationArgs),
    History,
    Pay { session: EntityId },
    Search { location: Option<String> },
    Parking { id: EntityId },
}

#[derive(Debug, Clone, PartialEq)]
pub struct NewReservationArgs {
    pub parking: EntityId,
    pub date: NaiveDate,
    pub time: NaiveTime,
    pub spot: Option<EntityId>,
}

fn arg<'a>(args: &'a [String], index: usize, name: &str) -> Result<&'a str> {
    args.get(index)
        .map(String::as_str)
        .ok_or_else(|| anyhow!("Missing <{}>. Run `parkflow help` for usage.", name))
}

fn parse_amount(input: &str) -> Result<MinorUnits> {
    match parse_major(input) {
        Some(minor) if minor > 0 => Ok(MinorUnits(minor)),
        Some(_) => bail!("Amount must be greater than zero"),
        None => bail!("Invalid amount '{}': use a number like 50 or 12.50", input),
    }
}

impl Command {
    pub fn parse(args: &[String]) -> Result<Self> {
        let Some(name) = args.first() else {
            return Ok(Command::Help);
        };

        let command = match name.as_str() {
            "help" | "--help" | "-h" => Command::Help,
            "login" => Command::Login {
                email: args.get(1).cloned(),
            },
            "logout" => Command::Logout,
            "status" => Command::Status,
            "register" => Command::Register,
            "verify" => Command::Verify {
                token: arg(args, 1, "token")?.to_string(),
            },
            "resend-verification" => Command::ResendVerification {
                email: arg(args, 1, "email")?.to_string(),
            },
            "profile" => Command::Profile,
            "dashboard" => Command::Dashboard,
            "wallet" => Command::Wallet,
            "topup" => {
                let amount = parse_amount(arg(args, 1, "amount")?)?;
                let method = args
                    .get(2)
                    .map(|m| m.to_ascii_lowercase())
                    .unwrap_or_else(|| DEFAULT_PAYMENT_METHOD.to_string());
                if !PAYMENT_METHODS.contains(&method.as_str()) {
                    bail!(
                        "Unknown payment method '{}' (expected one of: {})",
                        method,
                        PAYMENT_METHODS.join(", ")
                    );
                }
                Command::TopUp { amount, method }
            }
            "vehicles" => Command::Vehicles,
            "vehicle-add" => Command::VehicleAdd {
                plate: validate_plate(arg(args, 1, "plate")?).map_err(|e| anyhow!(e))?,
            },
            "vehicle-update" => Command::VehicleUpdate {
                id: EntityId::from(arg(args, 1, "id")?),
                plate: validate_plate(arg(args, 2, "plate")?).map_err(|e| anyhow!(e))?,
            },
            "vehicle-remove" => Command::VehicleRemove {
                id: EntityId::from(arg(args, 1, "id")?),
            },
            "reservations" => Command::Reservations,
            "reserve" => {
                let date = arg(args, 2, "date")?;
                let time = arg(args, 3, "time")?;
                Command::Reserve(NewReservationArgs {
                    parking: EntityId::from(arg(args, 1, "parking")?),
                    date: NaiveDate::parse_from_str(date, "%Y-%m-%d")
                        .with_context(|| format!("Invalid date '{}', expected YYYY-MM-DD", date))?,
                    time: NaiveTime::parse_from_str(time, "%H:%M")
                        .with_context(|| format!("Invalid time '{}', expected HH:MM", time))?,
                    spot: args.get(4).map(|s| EntityId::from(s.as_str())),
                })
            }
            "history" => Command::History,
            "pay" => Command::Pay {
                session: EntityId::from(arg(args, 1, "session")?),
            },
            "search" => Command::Search {
                location: (args.len() > 1).then(|| args[1..].join(" ")),
            },
            "parking" => Command::Parking {
                id: EntityId::from(arg(args, 1, "id")?),
            },
            other => bail!("Unknown command '{}'. Run `parkflow help` for usage.", other),
        };
        Ok(command)
    }
}

pub async fn run(command: Command, client: &ApiClient, config: &mut Config) -> Result<()> {
    debug!(?command, "Running command");
    match command {
        Command::Help => println!("{}", USAGE),
        Command::Login { email } => login(client, config, email).await?,
        Command::Logout => {
            client.logout().await?;
            println!("Signed out.");
        }
        Command::Status => status(client),
        Command::Register => register(client).await?,
        Command::Verify { token } => {
            let reply = client.verify_email(&token).await?;
            println!("{}", reply.message.as_deref().unwrap_or("Email verified. You can now sign in."));
        }
        Command::ResendVerification { email } => {
            if !is_valid_email(&email) {
                bail!("Please enter a valid email address");
            }
            let reply = client.resend_verification(&email).await?;
            println!("{}", reply.message.as_deref().unwrap_or("Verification email sent."));
        }
        Command::Profile => {
            let profile = client.profile().await?;
            println!("Name:  {}", profile.full_name());
            println!("Email: {}", profile.email);
        }
        Command::Dashboard => dashboard(client).await,
        Command::Wallet => {
            let wallet = client.wallet().await?;
            println!("Balance: {}", wallet.balance_minor.display(DEFAULT_CURRENCY));
        }
        Command::TopUp { amount, method } => {
            let receipt = client.top_up(amount, &method).await?;
            println!(
                "Added {} via {}. New balance: {}",
                amount.display(DEFAULT_CURRENCY),
                method,
                receipt.new_balance.display(DEFAULT_CURRENCY)
            );
        }
        Command::Vehicles => {
            let vehicles = client.vehicles().await?;
            if vehicles.is_empty() {
                println!("No vehicles registered. Add one with `parkflow vehicle-add <plate>`.");
            }
            for vehicle in vehicles {
                println!("{:>6}  {}", vehicle.id, vehicle.plate);
            }
        }
        Command::VehicleAdd { plate } => {
            let existing = client.vehicles().await?;
            if existing.iter().any(|v| v.plate == plate) {
                bail!("This vehicle is already registered");
            }
            let vehicle = client.add_vehicle(&plate).await?;
            println!("Added {} (id {}).", vehicle.plate, vehicle.id);
        }
        Command::VehicleUpdate { id, plate } => {
            let vehicle = client.update_vehicle(&id, &plate).await?;
            println!("Vehicle {} is now {}.", vehicle.id, vehicle.plate);
        }
        Command::VehicleRemove { id } => {
            client.delete_vehicle(&id).await?;
            println!("Removed vehicle {}.", id);
        }
        Command::Reservations => {
            let now = Utc::now();
            let reservations = client.reservations().await?;
            if reservations.is_empty() {
                println!("No reservations.");
            }
            for r in reservations {
                let until = r
                    .end_time
                    .map(|t| t.format("%Y-%m-%d %H:%M").to_string())
                    .unwrap_or_else(|| "-".to_string());
                let marker = if r.is_active(now) { "*" } else { " " };
                println!(
                    "{} {:>6}  {:<width$}  {:<10}  until {}",
                    marker,
                    r.id,
                    truncate_string(&r.parking_name, NAME_WIDTH),
                    r.status.as_deref().unwrap_or("-"),
                    until,
                    width = NAME_WIDTH
                );
            }
        }
        Command::Reserve(args) => reserve(client, args).await?,
        Command::History => history(client).await?,
        Command::Pay { session } => {
            client.pay_session(&session).await?;
            println!("Session {} paid.", session);
        }
        Command::Search { location } => {
            let locations = client.parking_locations(location.as_deref()).await?;
            if locations.is_empty() {
                println!("No parking locations found.");
            }
            for p in locations {
                println!(
                    "{:>6}  {:<width$}  {:>4}/{:<4} free  {}",
                    p.id,
                    truncate_string(&p.name, NAME_WIDTH),
                    p.available_spots,
                    p.total_spots,
                    p.hourly_rate_display(),
                    width = NAME_WIDTH
                );
            }
        }
        Command::Parking { id } => parking(client, id).await?,
    }
    Ok(())
}

async fn login(client: &ApiClient, config: &mut Config, email: Option<String>) -> Result<()> {
    let email = match email {
        Some(email) => email,
        None => prompt::line_or("Email", config.last_email.as_deref())?,
    };
    if !is_valid_email(&email) {
        bail!("Please enter a valid email address");
    }
    let password = prompt::password("Password")?;
    if password.is_empty() {
        bail!("Please fill in all fields");
    }

    client.login(&email, &password).await?;

    config.last_email = Some(email.clone());
    if let Err(e) = config.save() {
        debug!(error = %e, "Failed to remember last email");
    }
    println!("Signed in as {}.", email);
    Ok(())
}

fn status(client: &ApiClient) {
    let status = client.tokens().status();
    match status {
        TokenStatus::Valid { .. } => match status.expiry() {
            Some(expiry) => println!("Signed in until {}.", expiry.format("%Y-%m-%d %H:%M UTC")),
            None => println!("Signed in."),
        },
        TokenStatus::Expired { .. } => println!("Session expired. Run `parkflow login`."),
        TokenStatus::Missing => println!("Not signed in."),
        TokenStatus::Malformed(reason) => println!("Stored session is unusable ({}).", reason),
        TokenStatus::MissingExpiry => println!("Stored session has no expiry and cannot be used."),
    }
}

async fn register(client: &ApiClient) -> Result<()> {
    let email = prompt::line("Email")?;
    let first_name = prompt::line("First name")?;
    let last_name = prompt::line("Last name")?;
    let password = prompt::password("Password")?;
    let confirmation = prompt::password("Confirm password")?;

    if email.is_empty() || first_name.is_empty() || last_name.is_empty() || password.is_empty() {
        bail!("Please fill in all fields");
    }
    if !is_valid_email(&email) {
        bail!("Please enter a valid email address");
    }
    validate_password(&password, &confirmation).map_err(|e| anyhow!(e))?;

    let request = RegisterRequest {
        username: email.clone(),
        password,
        first_name,
        last_name,
    };
    let reply = client.register(&request).await?;
    println!("{}", reply.message.as_deref().unwrap_or("Account created."));
    println!("We've sent a verification email to {}. Confirm it with `parkflow verify <token>`.", email);
    Ok(())
}

async fn dashboard(client: &ApiClient) {
    let load = load_dashboard(client, Utc::now()).await;
    if load.login_required {
        return;
    }

    match &load.profile {
        Ok(profile) => println!("Welcome, {}!", profile.full_name()),
        Err(e) => println!("Profile: {}", e),
    }
    match &load.wallet {
        Ok(wallet) => println!("Balance: {}", wallet.balance_minor.display(DEFAULT_CURRENCY)),
        Err(e) => println!("Balance: unavailable ({})", e),
    }
    match &load.statistics {
        Ok(stats) => println!(
            "Sessions: {}  Time parked: {:.1} h  Spent: {}",
            stats.total_sessions,
            stats.total_time,
            stats.total_spent().display(DEFAULT_CURRENCY)
        ),
        Err(e) => println!("Statistics: unavailable ({})", e),
    }

    println!();
    match &load.reservations {
        Ok(active) if active.is_empty() => println!("No active reservations."),
        Ok(active) => {
            println!("Active reservations:");
            for r in active {
                let until = r
                    .end_time
                    .map(|t| t.format("%H:%M").to_string())
                    .unwrap_or_default();
                let spot = r.spot.as_ref().map(|s| format!(" spot {}", s)).unwrap_or_default();
                println!("  {}{} until {}", r.parking_name, spot, until);
            }
        }
        Err(e) => println!("Reservations: unavailable ({})", e),
    }

    match &load.vehicles {
        Ok(vehicles) if vehicles.is_empty() => println!("No vehicles registered."),
        Ok(vehicles) => {
            let plates: Vec<&str> = vehicles.iter().map(|v| v.plate.as_str()).collect();
            println!("Vehicles: {}", plates.join(", "));
        }
        Err(e) => println!("Vehicles: unavailable ({})", e),
    }
}

async fn reserve(client: &ApiClient, args: NewReservationArgs) -> Result<()> {
    match client.reservation_fee(&args.parking).await {
        Ok(fee) if !fee.is_zero() => println!("Reservation fee: {}", fee.display(DEFAULT_CURRENCY)),
        Ok(_) => {}
        Err(e) => debug!(error = %e, "Reservation fee unavailable"),
    }

    let new = NewReservation {
        parking_id: args.parking,
        spot_id: args.spot,
        date: args.date,
        time: args.time,
        duration_secs: None,
    };
    let id = client.create_reservation(&new).await?;
    println!("Reservation {} confirmed for {}.", id, new.start_date_time());
    Ok(())
}

async fn history(client: &ApiClient) -> Result<()> {
    let (sessions, statistics) = tokio::join!(client.history(), client.history_statistics());
    let sessions = sessions?;

    if sessions.is_empty() {
        println!("No parking sessions yet.");
    }
    for s in &sessions {
        println!(
            "{:>6}  {:<10}  {:<width$}  {:>8}  {:>12}  {}",
            s.id,
            s.date.as_deref().unwrap_or("-"),
            truncate_string(s.parking_name.as_deref().unwrap_or("Unknown"), NAME_WIDTH),
            s.duration.map(format_duration).unwrap_or_default(),
            s.cost().display(DEFAULT_CURRENCY),
            if s.is_paid { "paid" } else { "unpaid" },
            width = NAME_WIDTH
        );
    }

    match statistics {
        Ok(stats) => println!(
            "\n{} sessions, {:.1} h parked, {} spent",
            stats.total_sessions,
            stats.total_time,
            stats.total_spent().display(DEFAULT_CURRENCY)
        ),
        Err(e) => debug!(error = %e, "History statistics unavailable"),
    }
    Ok(())
}

async fn parking(client: &ApiClient, id: EntityId) -> Result<()> {
    let (details, occupancy) = tokio::join!(client.parking_details(&id), client.occupancy(&id));
    let details = details?;

    println!("{}", details.name);
    if !details.address.is_empty() {
        println!("{}", details.address);
    }
    println!(
        "Free spots: {}/{}  Rate: {}",
        details.available_spots,
        details.total_spots,
        details.hourly_rate_display()
    );
    if details.free_minutes > 0 {
        println!("First {} minutes free", details.free_minutes);
    }
    if !details.reservation_fee_minor.is_zero() {
        println!(
            "Reservation fee: {}",
            details.reservation_fee_minor.display(&details.currency_code)
        );
    }

    println!();
    print_occupancy(&occupancy);
    Ok(())
}

/// Typical occupancy as a bar per hour, peak marked with `|`
fn print_occupancy(occupancy: &Occupancy) {
    println!("Occupancy ({}):", occupancy.day_of_week);
    for (i, hour) in occupancy.hours.iter().enumerate() {
        let normal = occupancy.normal.get(i).copied().unwrap_or(0).min(100) as usize;
        let peak = occupancy.peak.get(i).copied().unwrap_or(0).min(100) as usize;
        let mut bar: Vec<char> = "#".repeat(normal / 5).chars().collect();
        bar.resize(20, ' ');
        if peak / 5 > 0 {
            bar[(peak / 5 - 1).min(19)] = '|';
        }
        let bar: String = bar.into_iter().collect();
        println!("  {:>5} {} {:>3}%", hour, bar, normal);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(line: &str) -> Result<Command> {
        let args: Vec<String> = line.split_whitespace().map(str::to_string).collect();
        Command::parse(&args)
    }

    #[test]
    fn test_no_args_is_help() {
        assert_eq!(parse("").unwrap(), Command::Help);
    }

    #[test]
    fn test_topup_parses_minor_units() {
        assert_eq!(
            parse("topup 12,50 card").unwrap(),
            Command::TopUp { amount: MinorUnits(1250), method: "card".into() }
        );
        assert_eq!(
            parse("topup 20").unwrap(),
            Command::TopUp { amount: MinorUnits(2000), method: "blik".into() }
        );
    }

    #[test]
    fn test_topup_rejects_bad_input() {
        assert!(parse("topup 0").is_err());
        assert!(parse("topup -5").is_err());
        assert!(parse("topup 1.234").is_err());
        assert!(parse("topup 10 cash").is_err());
        assert!(parse("topup").is_err());
    }

    #[test]
    fn test_vehicle_add_normalizes_plate() {
        assert_eq!(
            parse("vehicle-add wa12345").unwrap(),
            Command::VehicleAdd { plate: "WA12345".into() }
        );
        assert!(parse("vehicle-add W").is_err());
    }

    #[test]
    fn test_reserve() {
        let command = parse("reserve 3 2026-01-07 14:00 B2").unwrap();
        assert_eq!(
            command,
            Command::Reserve(NewReservationArgs {
                parking: EntityId::from(3),
                date: NaiveDate::from_ymd_opt(2026, 1, 7).unwrap(),
                time: NaiveTime::from_hms_opt(14, 0, 0).unwrap(),
                spot: Some(EntityId::from("B2")),
            })
        );
        assert!(parse("reserve 3 07/01/2026 14:00").is_err());
        assert!(parse("reserve 3 2026-01-07 2pm").is_err());
    }

    #[test]
    fn test_search_joins_location_words() {
        assert_eq!(
            parse("search Old Town").unwrap(),
            Command::Search { location: Some("Old Town".into()) }
        );
        assert_eq!(parse("search").unwrap(), Command::Search { location: None });
    }

    #[test]
    fn test_unknown_command() {
        assert!(parse("fly").is_err());
    }
}
