use anyhow::{Context, bail};
use chrono::NaiveDate;
use lawncare_tool::config::{self, AppConfig, StorageBackend, StorageConfig};
use lawncare_tool::logger::Logger;
use lawncare_tool::recurrence::{DATE_PREVIEW_LIMIT, format_dates_limited};
use lawncare_tool::report::{
    bookings_frame, clients_frame, occurrences_frame, render_text_table, services_frame,
};
use lawncare_tool::{
    BookingStatus, JsonLedgerStore, Ledger, LedgerStore, NewBooking, NewClient,
    RecurrenceFrequency, RecurrenceRequest, Service, load_bookings_from_csv, save_bookings_to_csv,
    save_occurrences_to_csv,
};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

const USAGE: &str = "\
Usage: lawncare [OPTIONS]

Options:
  --non-interactive    Run a brief demo and exit
  --config <path>      Load application configuration from a JSON file
  --no-seed            Do not seed demo clients and services
  -h, --help           Show this help

Environment:
  LAWNCARE_LOG         off|error|warn|info|debug|trace (stderr logging)
  LAWNCARE_TODAY       YYYY-MM-DD override for today's date";

#[derive(Debug, Default)]
struct Args {
    non_interactive: bool,
    config: Option<PathBuf>,
    no_seed: bool,
    help: bool,
}

impl Args {
    fn parse() -> anyhow::Result<Self> {
        use lexopt::prelude::*;

        let mut args = Args::default();
        let mut parser = lexopt::Parser::from_env();
        while let Some(arg) = parser.next()? {
            match arg {
                Long("non-interactive") => args.non_interactive = true,
                Long("config") => args.config = Some(PathBuf::from(parser.value()?)),
                Long("no-seed") => args.no_seed = true,
                Short('h') | Long("help") => args.help = true,
                _ => return Err(arg.unexpected().into()),
            }
        }
        Ok(args)
    }
}

fn main() -> ExitCode {
    match run() {
        Ok(code) => code,
        Err(err) => {
            let _ = writeln!(io::stderr(), "{err:#}");
            ExitCode::from(1)
        }
    }
}

fn run() -> anyhow::Result<ExitCode> {
    log::set_max_level(config::log_level_from_env()?);
    Logger::init()?;

    let args = Args::parse()?;
    if args.help {
        println!("{USAGE}");
        return Ok(ExitCode::SUCCESS);
    }

    let mut app_config = match &args.config {
        Some(path) => AppConfig::load(path)?,
        None => AppConfig::default(),
    };
    if args.no_seed {
        app_config.seed_demo_data = false;
    }
    let today = config::today()?;

    let mut ledger = match &app_config.storage {
        Some(storage) => open_ledger(storage, &app_config)?,
        None => Ledger::with_profile(app_config.profile.clone()),
    };
    if app_config.seed_demo_data {
        ledger.seed_demo_data()?;
    }

    let mut session = Session {
        ledger,
        storage: app_config.storage,
        today,
    };
    if args.non_interactive {
        session.demo()?;
    } else {
        session.interactive()?;
    }
    Ok(ExitCode::SUCCESS)
}

fn open_ledger(storage: &StorageConfig, app_config: &AppConfig) -> anyhow::Result<Ledger> {
    let loaded = load_store(storage.backend, &storage.path)?;
    Ok(match loaded {
        Some(ledger) => ledger,
        None => {
            log::info!(
                "nothing stored at {} yet, starting empty",
                storage.path.display()
            );
            Ledger::with_profile(app_config.profile.clone())
        }
    })
}

fn load_store(backend: StorageBackend, path: &Path) -> anyhow::Result<Option<Ledger>> {
    match backend {
        StorageBackend::Json => Ok(JsonLedgerStore::new(path).load_ledger()?),
        StorageBackend::Sqlite => sqlite_store(path)?
            .load_ledger()
            .map_err(anyhow::Error::from),
    }
}

fn save_store(backend: StorageBackend, path: &Path, ledger: &Ledger) -> anyhow::Result<()> {
    match backend {
        StorageBackend::Json => JsonLedgerStore::new(path).save_ledger(ledger)?,
        StorageBackend::Sqlite => sqlite_store(path)?.save_ledger(ledger)?,
    }
    Ok(())
}

#[cfg(feature = "sqlite")]
fn sqlite_store(path: &Path) -> anyhow::Result<Box<dyn LedgerStore>> {
    Ok(Box::new(lawncare_tool::SqliteLedgerStore::new(path)?))
}

#[cfg(not(feature = "sqlite"))]
fn sqlite_store(_path: &Path) -> anyhow::Result<Box<dyn LedgerStore>> {
    bail!("this build does not include sqlite support")
}

fn print_help() {
    println!(
        "Commands:\n  help                                         Show this help\n  clients                                      List clients\n  client add <first> <last> <email> <phone> <address...>\n                                               Add a client\n  client notes <id> <text...>                  Set client notes\n  client find <text...>                        Search clients by name, email, phone or address\n  client delete <id>                           Delete a client and their bookings\n  services                                     List services\n  service add <code> <price> <minutes> <name...>\n                                               Add or replace a service\n  service desc <code> <text...>                Set service description\n  service delete <code>                        Delete an unused service\n  bookings [client <id>|service <code>|status <status>]\n                                               List bookings, optionally filtered\n  booking add <client_id> <code> <YYYY-MM-DD> [repeat] [occurrences]\n                                               Add a booking\n  booking status <id> <status>                 Set booking status\n  booking reschedule <id> <YYYY-MM-DD>         Move the first visit\n  booking repeat <id> <repeat> <occurrences>   Change repeat pattern\n  booking notes <id> <text...>                 Set booking notes\n  booking delete <id>                          Delete a booking\n  occurrences <id>                             Show visit dates for a booking\n  agenda <start> <end>                         Visits between two dates (inclusive)\n  expand <YYYY-MM-DD> <repeat> <count>         Preview repeat dates\n  repeats                                      List repeat frequencies\n  statuses                                     List booking statuses\n  save [json|csv|sqlite <path>]                Save (csv writes bookings only)\n  load [json|csv|sqlite <path>]                Load (csv replaces bookings only)\n  export agenda <start> <end> <path>           Write visits to CSV\n  quit|exit                                    Exit"
    );
}

enum Flow {
    Continue,
    Quit,
}

struct Session {
    ledger: Ledger,
    storage: Option<StorageConfig>,
    today: NaiveDate,
}

impl Session {
    fn demo(&mut self) -> anyhow::Result<()> {
        println!("Demo mode: listing seed data and creating a sample booking...\n");
        self.print_clients()?;
        self.print_services()?;
        let client_id = self
            .ledger
            .clients()
            .next()
            .map(|c| c.id)
            .context("demo needs at least one client (run without --no-seed)")?;
        self.ledger.add_booking(
            NewBooking::new(client_id, "MOW", self.today)
                .repeating(RecurrenceFrequency::Fortnightly, 3)
                .with_notes("Front and back lawns"),
        )?;
        self.print_bookings(self.ledger.bookings().collect())?;
        println!("\nDone.");
        Ok(())
    }

    fn interactive(&mut self) -> anyhow::Result<()> {
        println!(
            "{} (CLI) - type 'help' for commands\n",
            self.ledger.profile().business_name
        );

        let stdin = io::stdin();
        let mut line = String::new();
        loop {
            print!("> ");
            let _ = io::stdout().flush();
            line.clear();
            if stdin.read_line(&mut line)? == 0 {
                break;
            }
            let input = line.trim();
            if input.is_empty() {
                continue;
            }
            match self.execute(input) {
                Ok(Flow::Continue) => {}
                Ok(Flow::Quit) => break,
                Err(err) => println!("Error: {err:#}"),
            }
        }
        println!("Goodbye!");
        Ok(())
    }

    fn execute(&mut self, input: &str) -> anyhow::Result<Flow> {
        let mut parts = input.split_whitespace();
        let cmd = parts.next().unwrap_or("");
        let args: Vec<&str> = parts.collect();

        match cmd {
            "help" => print_help(),
            "quit" | "exit" => return Ok(Flow::Quit),
            "clients" => self.print_clients()?,
            "client" => self.client_command(&args)?,
            "services" => self.print_services()?,
            "service" => self.service_command(&args)?,
            "bookings" => self.bookings_command(&args)?,
            "booking" => self.booking_command(&args)?,
            "occurrences" => {
                let [id] = args[..] else {
                    bail!("Usage: occurrences <id>");
                };
                let id = parse_id(id)?;
                let booking = self
                    .ledger
                    .booking(id)
                    .with_context(|| format!("no booking with id {id}"))?;
                println!(
                    "Booking #{} occurrences: {}",
                    booking.id,
                    format_dates_limited(
                        booking.recurrence_request().occurrences(),
                        DATE_PREVIEW_LIMIT
                    )
                );
            }
            "agenda" => {
                let [start, end] = args[..] else {
                    bail!("Usage: agenda <start> <end>");
                };
                let (start, end) = (parse_date(start)?, parse_date(end)?);
                let df = occurrences_frame(&self.ledger, start, end)?;
                println!("Agenda {start} to {end}:\n{}", render_text_table(&df));
            }
            "expand" => {
                let [date, repeat, count] = args[..] else {
                    bail!("Usage: expand <YYYY-MM-DD> <repeat> <count>");
                };
                let request = RecurrenceRequest::new(
                    parse_date(date)?,
                    RecurrenceFrequency::from_input(repeat),
                    parse_count(count)?,
                );
                println!(
                    "{}",
                    format_dates_limited(request.occurrences(), DATE_PREVIEW_LIMIT)
                );
            }
            "repeats" => {
                println!("Repeat frequencies:");
                for (key, description) in RecurrenceFrequency::variants() {
                    println!("  {:<12} {}", key, description);
                }
            }
            "statuses" => {
                println!("Booking statuses:");
                for (key, description) in BookingStatus::variants() {
                    println!("  {:<12} {}", key, description);
                }
            }
            "save" => self.save_command(&args)?,
            "load" => self.load_command(&args)?,
            "export" => {
                let ["agenda", start, end, path] = args[..] else {
                    bail!("Usage: export agenda <start> <end> <path>");
                };
                let count =
                    save_occurrences_to_csv(&self.ledger, parse_date(start)?, parse_date(end)?, path)?;
                println!("Exported {count} visit(s) to {path}");
            }
            _ => println!("Unknown command. Type 'help'."),
        }
        Ok(Flow::Continue)
    }

    fn client_command(&mut self, args: &[&str]) -> anyhow::Result<()> {
        match args {
            ["add", first, last, email, phone, address @ ..] if !address.is_empty() => {
                let client = self.ledger.add_client(NewClient::new(
                    *first,
                    *last,
                    *email,
                    *phone,
                    address.join(" "),
                ))?;
                println!("Added client #{}: {}", client.id, client.full_name());
            }
            ["notes", id, text @ ..] if !text.is_empty() => {
                let id = parse_id(id)?;
                self.ledger.set_client_notes(id, &text.join(" "))?;
                println!("Notes set for client #{id}.");
            }
            ["find", query @ ..] if !query.is_empty() => {
                let matches = self.ledger.find_clients(&query.join(" "));
                println!("{} match(es):", matches.len());
                for client in matches {
                    println!(
                        "  [{}] {} | {} | {} | {}",
                        client.id,
                        client.full_name(),
                        client.email,
                        client.phone,
                        client.address
                    );
                }
            }
            ["delete", id] => {
                let id = parse_id(id)?;
                let removed = self.ledger.delete_client(id)?;
                println!("Deleted client {id} ({removed} booking(s) removed).");
            }
            _ => bail!(
                "Usage: client add <first> <last> <email> <phone> <address...> | client notes <id> <text...> | client find <text...> | client delete <id>"
            ),
        }
        Ok(())
    }

    fn service_command(&mut self, args: &[&str]) -> anyhow::Result<()> {
        match args {
            ["add", code, price, minutes, name @ ..] if !name.is_empty() => {
                let price: f64 = price
                    .parse()
                    .with_context(|| format!("invalid price '{price}'"))?;
                let minutes: i64 = minutes
                    .parse()
                    .with_context(|| format!("invalid duration '{minutes}'"))?;
                let service = self
                    .ledger
                    .add_service(Service::new(code, name.join(" "), "", price, minutes))?;
                println!("Added service [{}] {}", service.code, service.name);
            }
            ["desc", code, text @ ..] if !text.is_empty() => {
                self.ledger.set_service_description(code, &text.join(" "))?;
                println!("Description set for service {}.", code.to_ascii_uppercase());
            }
            ["delete", code] => {
                let service = self.ledger.delete_service(code)?;
                println!("Deleted service {}.", service.code);
            }
            _ => bail!(
                "Usage: service add <code> <price> <minutes> <name...> | service desc <code> <text...> | service delete <code>"
            ),
        }
        Ok(())
    }

    fn bookings_command(&mut self, args: &[&str]) -> anyhow::Result<()> {
        let bookings = match args {
            [] => self.ledger.bookings().collect(),
            ["client", id] => self.ledger.bookings_for_client(parse_id(id)?),
            ["service", code] => self.ledger.bookings_for_service(code),
            ["status", status] => self.ledger.bookings_with_status(parse_status(status)?),
            _ => bail!("Usage: bookings [client <id>|service <code>|status <status>]"),
        };
        self.print_bookings(bookings)
    }

    fn booking_command(&mut self, args: &[&str]) -> anyhow::Result<()> {
        match args {
            ["add", client_id, code, date, rest @ ..] if rest.len() <= 2 => {
                let client_id = parse_id(client_id)?;
                let scheduled_date = parse_date(date)?;
                let repeat = rest
                    .first()
                    .map(|r| RecurrenceFrequency::from_input(r))
                    .unwrap_or_default();
                let occurrences = match rest.get(1) {
                    Some(count) => parse_count(count)?,
                    None => 1,
                };
                let booking = self.ledger.add_booking(
                    NewBooking::new(client_id, *code, scheduled_date).repeating(repeat, occurrences),
                )?;
                println!(
                    "Added booking #{} for client {} on {}",
                    booking.id, booking.client_id, booking.scheduled_date
                );
            }
            ["status", id, status] => {
                let id = parse_id(id)?;
                let status = parse_status(status)?;
                self.ledger.set_booking_status(id, status)?;
                println!("Booking #{id} is now {status}.");
            }
            ["reschedule", id, date] => {
                let id = parse_id(id)?;
                let date = parse_date(date)?;
                self.ledger.reschedule_booking(id, date)?;
                println!("Booking #{id} moved to {date}.");
            }
            ["repeat", id, repeat, count] => {
                let id = parse_id(id)?;
                let repeat = RecurrenceFrequency::from_input(repeat);
                self.ledger.set_booking_repeat(id, repeat, parse_count(count)?)?;
                println!("Booking #{id} repeats {repeat}.");
            }
            ["notes", id, text @ ..] if !text.is_empty() => {
                let id = parse_id(id)?;
                self.ledger.set_booking_notes(id, &text.join(" "))?;
                println!("Notes set for booking #{id}.");
            }
            ["delete", id] => {
                let id = parse_id(id)?;
                self.ledger.delete_booking(id)?;
                println!("Deleted booking {id}.");
            }
            _ => bail!(
                "Usage: booking add <client_id> <code> <YYYY-MM-DD> [repeat] [occurrences] | booking status|reschedule|repeat|notes|delete <id> ..."
            ),
        }
        Ok(())
    }

    fn save_command(&mut self, args: &[&str]) -> anyhow::Result<()> {
        match args {
            [] => {
                let storage = self
                    .storage
                    .as_ref()
                    .context("no storage configured; use save <json|csv|sqlite> <path>")?;
                save_store(storage.backend, &storage.path, &self.ledger)?;
                println!(
                    "Ledger saved to {} ({})",
                    storage.path.display(),
                    storage.backend
                );
            }
            ["csv", path] => {
                save_bookings_to_csv(&self.ledger, path)?;
                println!("Bookings saved to {path}");
            }
            [format, path] => {
                let backend = parse_backend(format)?;
                save_store(backend, Path::new(path), &self.ledger)?;
                println!("Ledger saved to {path} ({backend})");
            }
            _ => bail!("Usage: save [json|csv|sqlite <path>]"),
        }
        Ok(())
    }

    fn load_command(&mut self, args: &[&str]) -> anyhow::Result<()> {
        match args {
            [] => {
                let storage = self
                    .storage
                    .clone()
                    .context("no storage configured; use load <json|csv|sqlite> <path>")?;
                self.replace_ledger(storage.backend, &storage.path)?;
            }
            ["csv", path] => {
                let count = load_bookings_from_csv(&mut self.ledger, path)?;
                println!("Loaded {count} booking(s) from {path}");
            }
            [format, path] => {
                let backend = parse_backend(format)?;
                self.replace_ledger(backend, Path::new(path))?;
            }
            _ => bail!("Usage: load [json|csv|sqlite <path>]"),
        }
        Ok(())
    }

    fn replace_ledger(&mut self, backend: StorageBackend, path: &Path) -> anyhow::Result<()> {
        let ledger = load_store(backend, path)?
            .with_context(|| format!("nothing stored at {}", path.display()))?;
        self.ledger = ledger;
        println!("Ledger loaded from {} ({backend})", path.display());
        Ok(())
    }

    fn print_clients(&self) -> anyhow::Result<()> {
        println!("Clients:\n{}", render_text_table(&clients_frame(&self.ledger)?));
        Ok(())
    }

    fn print_services(&self) -> anyhow::Result<()> {
        println!("Services:\n{}", render_text_table(&services_frame(&self.ledger)?));
        Ok(())
    }

    fn print_bookings(&self, bookings: Vec<&lawncare_tool::Booking>) -> anyhow::Result<()> {
        let df = bookings_frame(&self.ledger, bookings)?;
        println!("Bookings:\n{}", render_text_table(&df));
        Ok(())
    }
}

fn parse_id(value: &str) -> anyhow::Result<i32> {
    value
        .parse()
        .with_context(|| format!("invalid id '{value}'"))
}

fn parse_count(value: &str) -> anyhow::Result<i64> {
    value
        .parse()
        .with_context(|| format!("invalid occurrence count '{value}'"))
}

fn parse_date(value: &str) -> anyhow::Result<NaiveDate> {
    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .with_context(|| format!("invalid date '{value}' (expected YYYY-MM-DD)"))
}

fn parse_status(value: &str) -> anyhow::Result<BookingStatus> {
    BookingStatus::parse(value).with_context(|| {
        format!("unknown status '{value}' (scheduled|completed|cancelled|skipped)")
    })
}

fn parse_backend(value: &str) -> anyhow::Result<StorageBackend> {
    StorageBackend::parse(value).with_context(|| format!("unknown format '{value}' (json|csv|sqlite)"))
}
