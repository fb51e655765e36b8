//! Integration tests for the foster application wizard and match listing.

use std::sync::Arc;

use serde_json::json;

use straymatch::context::{NavigationEvent, RecordingNavigator, SessionContext, UserId};
use straymatch::error::WizardError;
use straymatch::intake::{
    BackOutcome, FosterDraft, HomeType, SizePreference, SpeciesPreference, Wizard, WizardPhase,
};
use straymatch::matches::load_matches;
use straymatch::store::{Collection, Filter, MemoryStore, RecordStore};

fn context(store: Arc<MemoryStore>, nav: Arc<RecordingNavigator>) -> SessionContext {
    SessionContext::new(Some(UserId::new("foster-1")), store, nav)
}

#[tokio::test]
async fn full_application_walkthrough() {
    let store = Arc::new(MemoryStore::new());
    let nav = Arc::new(RecordingNavigator::new());
    let wizard: Wizard<FosterDraft> = Wizard::new(context(store.clone(), nav.clone()));

    // Step 1: household.
    let wizard = wizard
        .edit(|d| {
            d.full_name = "Sam Rivera".into();
            d.home_type = Some(HomeType::House);
            d.has_yard = Some(true);
        })
        .unwrap()
        .next()
        .unwrap();
    assert_eq!(wizard.step(), 2);

    // Step 2: experience is required.
    assert!(matches!(
        wizard.next(),
        Err(WizardError::Validation(ref e)) if e.mentions("pet_experience")
    ));
    let wizard = wizard
        .edit(|d| d.pet_experience = "Volunteered at the shelter".into())
        .unwrap()
        .next()
        .unwrap();

    // Step 3: species toggles and the animal count stepper.
    let wizard = wizard
        .edit(|d| {
            d.toggle_species(SpeciesPreference::Dog);
            d.toggle_species(SpeciesPreference::Cat);
            d.toggle_species(SpeciesPreference::Dog);
            d.toggle_size(SizePreference::Small);
            d.increment_max_animals();
        })
        .unwrap()
        .next()
        .unwrap();
    assert_eq!(wizard.draft().preferred_species, vec![SpeciesPreference::Cat]);
    assert_eq!(wizard.step(), 4);

    // Backing up and returning keeps every answer.
    let BackOutcome::Moved(back) = wizard.back().unwrap() else {
        panic!("step 4 should move back");
    };
    assert_eq!(back.draft(), wizard.draft());
    let wizard = back.next().unwrap();

    // Step 4 answers, then submit.
    let done = wizard
        .edit(|d| {
            d.has_other_pets = Some(false);
            d.has_criminal_history = Some(false);
        })
        .unwrap()
        .submit()
        .await
        .unwrap();
    let WizardPhase::Done { record_id } = done.phase().clone() else {
        panic!("expected Done, got {:?}", done.phase());
    };

    let stored = store
        .get_one(Collection::FosterApplications, &Filter::new().eq("user_id", "foster-1"))
        .await
        .unwrap()
        .unwrap();
    assert_eq!(stored.id, record_id);
    assert_eq!(stored.data["preferred_species"], json!(["cat"]));
    assert_eq!(stored.data["preferred_size"], json!(["small"]));
    assert_eq!(stored.data["max_animals"], 2);
    assert_eq!(stored.data["home_type"], "house");
    assert_eq!(stored.data["status"], "pending");

    assert_eq!(
        nav.events(),
        vec![NavigationEvent::Submitted {
            collection: Collection::FosterApplications,
            id: record_id,
        }]
    );
}

#[tokio::test]
async fn application_preferences_drive_matches() {
    let store = Arc::new(MemoryStore::new());
    for species in ["dog", "cat", "cat"] {
        store
            .insert(
                Collection::FoundAnimals,
                json!({ "species": species, "status": "active", "size": "small" }),
            )
            .await
            .unwrap();
    }
    let ctx = context(store.clone(), Arc::new(RecordingNavigator::new()));

    let draft = FosterDraft {
        home_type: Some(HomeType::Apartment),
        has_yard: Some(false),
        has_other_pets: Some(true),
        pet_experience: "Two cats of my own".into(),
        preferred_species: vec![SpeciesPreference::Cat],
        has_criminal_history: Some(false),
        ..Default::default()
    };
    let mut wizard = Wizard::with_prefill(ctx.clone(), draft);
    while !wizard.is_final_step() {
        wizard = wizard.next().unwrap();
    }
    wizard.submit().await.unwrap();

    let matches = load_matches(&ctx).await.unwrap();
    assert!(matches.application.is_some());
    assert_eq!(matches.animals.len(), 2);
    assert!(matches.animals.iter().all(|a| a.data["species"] == "cat"));
}

#[tokio::test]
async fn cancel_from_first_step_discards_without_writing() {
    let store = Arc::new(MemoryStore::new());
    let nav = Arc::new(RecordingNavigator::new());
    let wizard: Wizard<FosterDraft> = Wizard::new(context(store.clone(), nav.clone()));
    let wizard = wizard.edit(|d| d.home_type = Some(HomeType::Condo)).unwrap();

    assert!(matches!(wizard.back().unwrap(), BackOutcome::Cancelled));
    assert_eq!(nav.events(), vec![NavigationEvent::Cancelled]);
    assert!(store.all(Collection::FosterApplications).await.is_empty());
}
