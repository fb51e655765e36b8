//! Terminal front-end: a stdin REPL over the chat flow, with line-by-line
//! versions of the report and foster forms.

use std::str::FromStr;
use std::sync::Arc;

use tokio::io::{AsyncBufRead, AsyncBufReadExt, Lines};
use tokio::sync::mpsc;

use crate::chat::{ChatFlow, QuickAction, SendOutcome};
use crate::config::ChatConfig;
use crate::context::{NavigationEvent, SessionContext};
use crate::emergency;
use crate::error::{ValidationError, WizardError};
use crate::intake::{
    AnimalSize, BackOutcome, FosterDraft, GeoPoint, HealthStatus, HomeType, IntakeForm,
    ReportDraft, SizePreference, Species, SpeciesPreference, Wizard, WizardPhase,
};
use crate::llm::LlmProvider;
use crate::matches;

/// A parsed REPL line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Quit,
    Help,
    Actions,
    Quick(QuickAction),
    Emergency,
    Matches,
    Foster,
    Report,
    Say(String),
}

impl Command {
    /// `None` for blank lines and unknown slash commands.
    pub fn parse(line: &str) -> Option<Self> {
        let line = line.trim();
        if line.is_empty() {
            return None;
        }
        let Some(cmd) = line.strip_prefix('/') else {
            return Some(Self::Say(line.to_string()));
        };
        match cmd.to_ascii_lowercase().as_str() {
            "quit" | "exit" | "q" => Some(Self::Quit),
            "help" | "?" => Some(Self::Help),
            "actions" => Some(Self::Actions),
            "emergency" => Some(Self::Emergency),
            "matches" => Some(Self::Matches),
            "foster" => Some(Self::Foster),
            "report" => Some(Self::Report),
            other => other
                .parse::<usize>()
                .ok()
                .and_then(QuickAction::from_index)
                .map(Self::Quick),
        }
    }
}

const HELP: &str = "\
Commands:
  /actions     list quick actions (while the chat is fresh)
  /1 .. /6     run a quick action
  /report      open the found-animal report form
  /foster      open the foster application
  /matches     list animals matching your foster application
  /emergency   emergency contacts
  /quit        exit
Anything else is sent to the assistant.";

/// Parse a category answer.
pub fn parse_choice<T: FromStr<Err = String>>(input: &str) -> Result<T, String> {
    input.parse()
}

/// Parse a comma-separated list of category answers.
pub fn parse_list<T: FromStr<Err = String>>(input: &str) -> Result<Vec<T>, String> {
    input
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::parse)
        .collect()
}

pub fn parse_bool(input: &str) -> Option<bool> {
    match input.trim().to_ascii_lowercase().as_str() {
        "y" | "yes" | "true" => Some(true),
        "n" | "no" | "false" => Some(false),
        _ => None,
    }
}

/// Parse `lat,lng`.
pub fn parse_location(input: &str) -> Result<GeoPoint, ValidationError> {
    let bad = || ValidationError::invalid("location", "expected `lat,lng`");
    let (lat, lng) = input.split_once(',').ok_or_else(bad)?;
    let lat: f64 = lat.trim().parse().map_err(|_| bad())?;
    let lng: f64 = lng.trim().parse().map_err(|_| bad())?;
    GeoPoint::new(lat, lng)
}

fn options<T: std::fmt::Display>(all: &[T]) -> String {
    all.iter().map(ToString::to_string).collect::<Vec<_>>().join("/")
}

fn shown<T: std::fmt::Display>(value: &Option<T>) -> String {
    value.as_ref().map_or_else(|| "-".to_string(), ToString::to_string)
}

/// Line-oriented prompt reader.
pub struct Terminal<R> {
    lines: Lines<R>,
    eof: bool,
}

impl<R: AsyncBufRead + Unpin> Terminal<R> {
    pub fn new(reader: R) -> Self {
        Self {
            lines: reader.lines(),
            eof: false,
        }
    }

    async fn next_line(&mut self) -> anyhow::Result<Option<String>> {
        let line = self.lines.next_line().await?;
        self.eof = line.is_none();
        Ok(line)
    }

    /// Print `prompt` and read one line. `None` on end of input.
    async fn ask(&mut self, prompt: &str) -> anyhow::Result<Option<String>> {
        eprint!("{prompt}: ");
        Ok(self.next_line().await?.map(|l| l.trim().to_string()))
    }

    /// Ask for a value; a blank answer keeps `current`. Re-asks on bad input.
    async fn ask_parsed<T>(
        &mut self,
        prompt: &str,
        current: Option<T>,
        parse: impl Fn(&str) -> Result<T, String>,
    ) -> anyhow::Result<Option<T>> {
        loop {
            let Some(answer) = self.ask(prompt).await? else {
                return Ok(current);
            };
            if answer.is_empty() {
                return Ok(current);
            }
            match parse(&answer) {
                Ok(value) => return Ok(Some(value)),
                Err(e) => eprintln!("  {e}"),
            }
        }
    }

    async fn ask_text(&mut self, prompt: &str, current: &str) -> anyhow::Result<String> {
        let label = if current.is_empty() {
            prompt.to_string()
        } else {
            format!("{prompt} [{current}]")
        };
        Ok(match self.ask(&label).await? {
            Some(answer) if !answer.is_empty() => answer,
            _ => current.to_string(),
        })
    }

    async fn ask_bool(&mut self, prompt: &str, current: Option<bool>) -> anyhow::Result<Option<bool>> {
        let label = format!("{prompt} (y/n) [{}]", shown(&current));
        self.ask_parsed(&label, current, |s| {
            parse_bool(s).ok_or_else(|| "answer y or n".to_string())
        })
        .await
    }

    async fn edit_report(&mut self, draft: &mut ReportDraft) -> anyhow::Result<()> {
        draft.species = self
            .ask_parsed(
                &format!("Species ({}) [{}]", options(Species::ALL), shown(&draft.species)),
                draft.species,
                parse_choice,
            )
            .await?;
        draft.size = self
            .ask_parsed(
                &format!("Size ({}) [{}]", options(AnimalSize::ALL), shown(&draft.size)),
                draft.size,
                parse_choice,
            )
            .await?;
        draft.health_status = self
            .ask_parsed(
                &format!(
                    "Health ({}) [{}]",
                    options(HealthStatus::ALL),
                    shown(&draft.health_status)
                ),
                draft.health_status,
                parse_choice,
            )
            .await?;
        draft.color = self.ask_text("Color", &draft.color).await?;
        draft.breed = self.ask_text("Breed", &draft.breed).await?;
        draft.description = self.ask_text("Description", &draft.description).await?;

        let current = draft.location.map(|p| format!("{},{}", p.lat, p.lng));
        draft.location = self
            .ask_parsed(
                &format!("Location lat,lng [{}]", shown(&current)),
                draft.location,
                |s| parse_location(s).map_err(|e| e.to_string()),
            )
            .await?;

        if let Some(photos) = self.ask("Photo paths, comma-separated (blank for none)").await? {
            for path in photos.split(',').map(str::trim).filter(|p| !p.is_empty()) {
                draft.add_photo(path);
            }
        }
        Ok(())
    }

    /// Walk the found-animal report form.
    pub async fn run_report(&mut self, ctx: SessionContext, prefill: ReportDraft) -> anyhow::Result<()> {
        println!("\n-- Report a found animal --");
        let mut wizard = Wizard::with_prefill(ctx, prefill);
        loop {
            let mut draft = wizard.draft().clone();
            self.edit_report(&mut draft).await?;
            wizard = wizard.edit(|d| *d = draft)?;

            match wizard.submit().await {
                Ok(next) => wizard = next,
                Err(WizardError::Validation(e)) => {
                    eprintln!("  {e}");
                    if self.eof {
                        return Ok(());
                    }
                    continue;
                }
                Err(e) => return Err(e.into()),
            }
            if self.finish(&wizard).await? {
                return Ok(());
            }
        }
    }

    /// Report the submit outcome. `true` when the form is finished.
    async fn finish<F: IntakeForm>(&mut self, wizard: &Wizard<F>) -> anyhow::Result<bool> {
        match wizard.phase() {
            WizardPhase::Done { record_id } => {
                println!("Submitted ({record_id}). Thank you!");
                Ok(true)
            }
            WizardPhase::Failed { reason } => {
                eprintln!("  Submit failed: {reason}");
                let retry = self.ask("Try again? (y/n)").await?;
                Ok(!retry.as_deref().and_then(parse_bool).unwrap_or(false))
            }
            WizardPhase::Editing | WizardPhase::Submitting => Ok(false),
        }
    }

    async fn edit_foster_step(&mut self, step: usize, draft: &mut FosterDraft) -> anyhow::Result<()> {
        match step {
            1 => {
                draft.full_name = self.ask_text("Full name", &draft.full_name).await?;
                draft.phone_number = self.ask_text("Phone", &draft.phone_number).await?;
                draft.address = self.ask_text("Address", &draft.address).await?;
                draft.home_type = self
                    .ask_parsed(
                        &format!("Home type ({}) [{}]", options(HomeType::ALL), shown(&draft.home_type)),
                        draft.home_type,
                        parse_choice,
                    )
                    .await?;
                draft.has_yard = self.ask_bool("Has a yard?", draft.has_yard).await?;
            }
            2 => {
                draft.pet_experience = self.ask_text("Pet experience", &draft.pet_experience).await?;
                draft.references = self.ask_text("References", &draft.references).await?;
            }
            3 => {
                let species = self
                    .ask_parsed(
                        &format!("Species to toggle ({}), comma-separated", options(SpeciesPreference::ALL)),
                        None,
                        parse_list::<SpeciesPreference>,
                    )
                    .await?;
                for s in species.unwrap_or_default() {
                    draft.toggle_species(s);
                }
                let sizes = self
                    .ask_parsed(
                        &format!("Sizes to toggle ({}), comma-separated", options(SizePreference::ALL)),
                        None,
                        parse_list::<SizePreference>,
                    )
                    .await?;
                for s in sizes.unwrap_or_default() {
                    draft.toggle_size(s);
                }
                println!(
                    "  Selected: species [{}], sizes [{}]",
                    options(&draft.preferred_species),
                    options(&draft.preferred_size)
                );
                loop {
                    let answer = self
                        .ask(&format!("Max animals {} (+/-, blank to keep)", draft.max_animals))
                        .await?;
                    match answer.as_deref() {
                        Some("+") => draft.increment_max_animals(),
                        Some("-") => draft.decrement_max_animals(),
                        _ => break,
                    }
                }
            }
            _ => {
                draft.has_other_pets = self.ask_bool("Other pets at home?", draft.has_other_pets).await?;
                draft.has_criminal_history = self
                    .ask_bool("Any criminal history?", draft.has_criminal_history)
                    .await?;
            }
        }
        Ok(())
    }

    /// Walk the four-step foster application.
    pub async fn run_foster(&mut self, ctx: SessionContext) -> anyhow::Result<()> {
        println!("\n-- Foster application --");
        let mut wizard: Wizard<FosterDraft> = Wizard::new(ctx);
        loop {
            println!("Step {} of {}", wizard.step(), wizard.total_steps());
            let mut draft = wizard.draft().clone();
            self.edit_foster_step(wizard.step(), &mut draft).await?;
            wizard = wizard.edit(|d| *d = draft)?;

            let action = if wizard.is_final_step() {
                "[s]ubmit, [b]ack"
            } else {
                "[n]ext, [b]ack"
            };
            let Some(answer) = self.ask(action).await? else {
                return Ok(());
            };
            match answer.to_ascii_lowercase().as_str() {
                "b" | "back" => match wizard.back()? {
                    BackOutcome::Moved(prev) => wizard = prev,
                    BackOutcome::Cancelled => {
                        println!("Application discarded.");
                        return Ok(());
                    }
                },
                "s" | "submit" if wizard.is_final_step() => match wizard.submit().await {
                    Ok(next) => {
                        wizard = next;
                        if self.finish(&wizard).await? {
                            return Ok(());
                        }
                    }
                    Err(e) => eprintln!("  {e}"),
                },
                _ => match wizard.next() {
                    Ok(next) => wizard = next,
                    Err(e) => eprintln!("  {e}"),
                },
            }
        }
    }
}

/// Run the chat REPL until `/quit` or end of input.
pub async fn run<R: AsyncBufRead + Unpin>(
    reader: R,
    ctx: SessionContext,
    llm: Arc<dyn LlmProvider>,
    chat: ChatConfig,
    mut navigation: mpsc::UnboundedReceiver<NavigationEvent>,
) -> anyhow::Result<()> {
    let mut term = Terminal::new(reader);
    let flow = ChatFlow::start(ctx.clone(), llm, chat).await;

    if let Some(greeting) = flow.transcript().await.last() {
        println!("\n{}\n", greeting.content);
    }
    print_actions();

    loop {
        eprint!("> ");
        tokio::select! {
            line = term.next_line() => {
                let Some(line) = line? else { break };
                let Some(command) = Command::parse(&line) else { continue };
                match command {
                    Command::Quit => break,
                    Command::Help => println!("{HELP}"),
                    Command::Actions => {
                        if flow.quick_actions_visible().await {
                            print_actions();
                        } else {
                            println!("Quick actions are only available before the conversation starts.");
                        }
                    }
                    Command::Quick(action) => show_outcome(&flow, flow.quick_action(action).await).await,
                    Command::Say(text) => {
                        eprintln!("...");
                        show_outcome(&flow, flow.send_message(&text).await).await;
                    }
                    Command::Emergency => print_emergency(),
                    Command::Matches => print_matches(&ctx).await,
                    Command::Foster => term.run_foster(ctx.clone()).await?,
                    Command::Report => term.run_report(ctx.clone(), ReportDraft::default()).await?,
                }
            }
            Some(event) = navigation.recv() => {
                if let NavigationEvent::OpenReportForm { prefill } = event {
                    term.run_report(ctx.clone(), *prefill).await?;
                }
            }
        }
    }
    Ok(())
}

async fn show_outcome(flow: &ChatFlow, outcome: SendOutcome) {
    match outcome {
        SendOutcome::Replied { .. } | SendOutcome::Fallback => {
            if let Some(reply) = flow.transcript().await.last() {
                println!("\n{}\n", reply.content);
            }
        }
        SendOutcome::Rejected(reason) => tracing::debug!(?reason, "Message not sent"),
        SendOutcome::OpenedForm => {}
    }
}

fn print_actions() {
    println!("Quick actions:");
    for (i, action) in QuickAction::ALL.iter().enumerate() {
        println!("  /{}  {}", i + 1, action.label());
    }
}

fn print_emergency() {
    println!("{}", emergency::LIFE_THREATENING_NOTICE);
    for contact in emergency::QUICK_DIAL.iter().chain(emergency::RESOURCES) {
        println!("  {} ({}): {}", contact.name, contact.detail, contact.tel_uri());
        if let Some(address) = contact.address {
            println!("    {address}");
        }
    }
    println!("Safety tips:");
    for tip in emergency::SAFETY_TIPS {
        println!("  - {tip}");
    }
}

async fn print_matches(ctx: &SessionContext) {
    match matches::load_matches(ctx).await {
        Ok(found) if found.animals.is_empty() => println!("No animals available right now."),
        Ok(found) => {
            for animal in &found.animals {
                let field = |k: &str| animal.data.get(k).and_then(|v| v.as_str()).unwrap_or("-").to_string();
                println!(
                    "  {} {} ({}), urgency {}: {}",
                    field("species"),
                    field("size"),
                    field("health_status"),
                    field("urgency_level"),
                    field("description"),
                );
            }
        }
        Err(e) => {
            tracing::warn!("Could not load matches: {}", e);
            eprintln!("Could not load matches: {e}");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::{RecordingNavigator, UserId};
    use crate::store::{Collection, MemoryStore};

    #[test]
    fn parses_commands() {
        assert_eq!(Command::parse("  "), None);
        assert_eq!(Command::parse("/quit"), Some(Command::Quit));
        assert_eq!(Command::parse("/2"), Some(Command::Quick(QuickAction::FoundCat)));
        assert_eq!(Command::parse("/9"), None);
        assert_eq!(
            Command::parse(" found a dog "),
            Some(Command::Say("found a dog".into()))
        );
    }

    #[test]
    fn parses_answers() {
        assert_eq!(parse_choice::<Species>("Dog"), Ok(Species::Dog));
        assert!(parse_choice::<Species>("horse").is_err());
        assert_eq!(
            parse_list::<SpeciesPreference>("dog, either"),
            Ok(vec![SpeciesPreference::Dog, SpeciesPreference::Either])
        );
        assert_eq!(parse_bool("Yes"), Some(true));
        assert_eq!(parse_bool("maybe"), None);
        let point = parse_location("29.42, -98.49").unwrap();
        assert_eq!((point.lat, point.lng), (29.42, -98.49));
        assert!(parse_location("north").is_err());
    }

    #[tokio::test]
    async fn report_form_submits_from_scripted_input() {
        let store = Arc::new(MemoryStore::new());
        let ctx = SessionContext::new(
            Some(UserId::new("u1")),
            store.clone(),
            Arc::new(RecordingNavigator::new()),
        );
        let prefill = ReportDraft {
            species: Some(Species::Dog),
            ..Default::default()
        };
        // species kept, size, health, color, breed, description, location, photos
        let input: &[u8] = b"\nlarge\ninjured\nblack\n\nLimping by the creek\n29.4,-98.5\n\n";
        let mut term = Terminal::new(input);
        term.run_report(ctx, prefill).await.unwrap();

        let rows = store.all(Collection::FoundAnimals).await;
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].data["species"], "dog");
        assert_eq!(rows[0].data["urgency_level"], "high");
    }
}
