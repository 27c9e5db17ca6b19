//! Fact-find state machine
//!
//! COLLECTING -> FINISHED. Each call to `chat_response` advances the
//! conversation by one user turn: prompt the model, extract fields from its
//! answer, merge them into a copy of the user record, and produce the reply.

use chrono::{Local, NaiveDate};
use tracing::{debug, info};

use super::{ConversationState, ExtractedInformation, Message};
use crate::config::FactFinderSettings;
use crate::error::FactFindError;
use crate::extractor::{
    ExtractedInfo, Extractor, FieldKind, GoalSection, HeuristicExtractor, SectionFields,
};
use crate::llm::LanguageModel;
use crate::models::{
    is_set, Goal, GoalSpecificInformation, NewCarInformation, NewHomeGoalInformation,
    OtherGoalInformation, User,
};
use crate::Result;

/// Reply header once every identity field is known
pub const COMPLETION_MESSAGE: &str = "Thanks, all info collected!";

/// Drives the fact-find conversation
pub struct FactFinder<M, E = HeuristicExtractor> {
    model: M,
    extractor: E,
    settings: FactFinderSettings,
    today: Option<NaiveDate>,
}

impl<M: LanguageModel> FactFinder<M> {
    pub fn new(model: M) -> Self {
        Self::with_extractor(model, HeuristicExtractor::new())
    }
}

impl<M: LanguageModel, E: Extractor> FactFinder<M, E> {
    pub fn with_extractor(model: M, extractor: E) -> Self {
        Self {
            model,
            extractor,
            settings: FactFinderSettings::default(),
            today: None,
        }
    }

    pub fn with_settings(mut self, settings: FactFinderSettings) -> Self {
        self.settings = settings;
        self
    }

    /// Pin the date used as the date-of-birth fallback
    pub fn with_today(mut self, today: NaiveDate) -> Self {
        self.today = Some(today);
        self
    }

    pub fn model(&self) -> &M {
        &self.model
    }

    pub fn settings(&self) -> &FactFinderSettings {
        &self.settings
    }

    /// Advance the conversation by one user turn.
    ///
    /// `state` is left untouched; on error nothing from this turn is kept.
    pub async fn chat_response(&self, state: &ConversationState) -> Result<ConversationState> {
        let last_message = state
            .last_message()
            .ok_or(FactFindError::EmptyConversation)?;

        let prompt = build_prompt(last_message.text());
        let answer = self.model.generate(&prompt).await?;
        debug!(answer = %answer, "Model answer");

        let parsed = self.extractor.extract(&answer);
        debug!(
            parsed = %serde_json::to_string(&parsed).unwrap_or_default(),
            "Parsed info"
        );

        // Build every goal before touching the user so a bad section
        // cannot leave a half-merged record behind.
        let goals = build_goals(&parsed)?;

        let user = match state.user() {
            Some(existing) => {
                let mut user = existing.clone();
                fill_missing(&mut user, &parsed);
                Some(user)
            }
            None if parsed.has_identity() || !goals.is_empty() => Some(self.new_user(&parsed)),
            None => None,
        };

        let user = user.map(|mut user| {
            user.goals.extend(goals);
            user
        });

        let finished = user.as_ref().is_some_and(User::is_complete);
        let extracted_information = ExtractedInformation::new(user);

        let (goal_count, missing) = match &extracted_information.user {
            Some(user) => (user.goals.len(), user.missing_fields()),
            None => (0, User::default().missing_fields()),
        };
        info!(finished, goals = goal_count, missing = ?missing, "Turn complete");

        let reply = Message::ai(if finished {
            format!("{}\n\n{}", COMPLETION_MESSAGE, extracted_information)
        } else {
            answer
        });
        debug!(message_id = %reply.message_id(), timestamp = %reply.timestamp(), "Reply ready");

        Ok(ConversationState {
            finished,
            messages: state.messages.clone(),
            new_messages: vec![reply],
            extracted_information,
        })
    }

    fn new_user(&self, parsed: &ExtractedInfo) -> User {
        let date_of_birth = parsed.date_of_birth.or_else(|| {
            self.settings
                .dob_fallback_today
                .then(|| self.today.unwrap_or_else(|| Local::now().date_naive()))
        });

        User {
            first_name: parsed.first_name.clone(),
            last_name: parsed.last_name.clone(),
            email: parsed.email.clone(),
            date_of_birth,
            goals: Vec::new(),
        }
    }
}

/// First write wins: only unset fields take the extracted value
fn fill_missing(user: &mut User, parsed: &ExtractedInfo) {
    fill(&mut user.first_name, &parsed.first_name);
    fill(&mut user.last_name, &parsed.last_name);
    fill(&mut user.email, &parsed.email);
    if user.date_of_birth.is_none() {
        user.date_of_birth = parsed.date_of_birth;
    }
}

fn fill(field: &mut Option<String>, value: &Option<String>) {
    if !is_set(field) && value.is_some() {
        field.clone_from(value);
    }
}

/// One goal per section found, in section order.
///
/// An empty car section is skipped; empty home and other sections still
/// fail on their first required field.
fn build_goals(parsed: &ExtractedInfo) -> Result<Vec<Goal>> {
    let mut goals = Vec::new();
    for section in GoalSection::ALL {
        let Some(fields) = parsed.section(section) else {
            continue;
        };
        if section == GoalSection::NewCar && fields.is_empty() {
            continue;
        }
        goals.push(Goal::new(goal_information(section, fields)?));
    }
    Ok(goals)
}

fn goal_information(
    section: GoalSection,
    fields: &SectionFields,
) -> Result<GoalSpecificInformation> {
    let info = match section {
        GoalSection::NewHome => GoalSpecificInformation::NewHome(NewHomeGoalInformation {
            location: fields.text(section, "location")?,
            house_price: fields.number(section, "house_price")?,
            deposit_amount: fields.number(section, "deposit_amount")?,
            purchase_date: fields.date(section, "purchase_date")?,
        }),
        GoalSection::NewCar => GoalSpecificInformation::NewCar(NewCarInformation {
            car_type: fields.text(section, "car_type")?,
            car_price: fields.number(section, "car_price")?,
            purchase_date: fields.date(section, "purchase_date")?,
        }),
        GoalSection::Other => GoalSpecificInformation::Other(OtherGoalInformation {
            description: fields.text(section, "description")?,
            amount_required: fields.number(section, "amount_required")?,
            target_date: fields.date(section, "target_date")?,
        }),
    };
    Ok(info)
}

/// Extraction instruction sent to the model for one user message
pub fn build_prompt(user_message: &str) -> String {
    let schemas: Vec<String> = GoalSection::ALL
        .iter()
        .map(|section| {
            let fields: Vec<String> = section
                .fields()
                .iter()
                .map(|(name, kind)| match kind {
                    FieldKind::Date => format!("{} (YYYY-MM-DD)", name),
                    _ => name.to_string(),
                })
                .collect();
            format!("{}({})", section.key(), fields.join(", "))
        })
        .collect();

    format!(
        "Extract structured user info from the following message without reasoning \
         and don't pass the keys if they are null:\n\
         Expected keys: name, email, date_of_birth (YYYY-MM-DD),\n\
         {}\n\
         {}",
        schemas.join(",\n"),
        user_message
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::ScriptedModel;
    use crate::models::GoalType;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn strict_finder(replies: &[&str]) -> FactFinder<ScriptedModel> {
        FactFinder::new(ScriptedModel::new(replies.iter().copied())).with_settings(
            FactFinderSettings {
                dob_fallback_today: false,
            },
        )
    }

    async fn turn<M: LanguageModel>(
        finder: &FactFinder<M>,
        state: ConversationState,
        text: &str,
    ) -> Result<ConversationState> {
        let mut state = state;
        state.push_user_message(text);
        let mut next = finder.chat_response(&state).await?;
        next.commit_new_messages();
        Ok(next)
    }

    const CAR_BLOCK: &str = "\"NewCarInformation\": {\n\
                             \"car_type\": \"estate\",\n\
                             \"car_price\": 18000,\n\
                             \"purchase_date\": \"2026-03-01\"\n\
                             },";

    #[tokio::test]
    async fn test_first_write_wins_for_email() {
        let finder = strict_finder(&["email: ada@example.com", "email: other@example.com"]);

        let state = turn(&finder, ConversationState::new(), "my email is ada@example.com")
            .await
            .unwrap();
        let state = turn(&finder, state, "actually use other@example.com").await.unwrap();

        assert_eq!(state.user().unwrap().email.as_deref(), Some("ada@example.com"));
    }

    #[tokio::test]
    async fn test_finishes_on_turn_supplying_last_field() {
        let first_answer = "name: \"Ada Lovelace\"\nCould you share your e-mail address?";
        let finder = strict_finder(&[
            first_answer,
            "email: ada@example.com\nWhen were you born?",
            "date_of_birth: 1990-05-12",
        ]);

        let state = turn(&finder, ConversationState::new(), "I'm Ada Lovelace").await.unwrap();
        assert!(!state.finished);
        assert_eq!(state.last_message().unwrap().text(), first_answer);

        let state = turn(&finder, state, "ada@example.com").await.unwrap();
        assert!(!state.finished);
        assert_eq!(state.user().unwrap().missing_fields(), vec!["date_of_birth"]);

        let state = turn(&finder, state, "12 May 1990").await.unwrap();
        assert!(state.finished);
        assert_eq!(state.user().unwrap().date_of_birth, Some(date(1990, 5, 12)));

        let reply = state.last_message().unwrap().text();
        assert!(reply.starts_with(COMPLETION_MESSAGE));
        assert!(reply.contains("Name: ada lovelace"));
        assert!(reply.contains("Email: ada@example.com"));
        assert!(reply.contains("DOB: 1990-05-12"));
        assert_eq!(state.messages.len(), 6);
    }

    #[tokio::test]
    async fn test_dob_falls_back_to_today() {
        let model = ScriptedModel::new(["name: Ada Lovelace", "date_of_birth: 1990-05-12"]);
        let finder = FactFinder::new(model).with_today(date(2026, 10, 18));
        assert!(finder.settings().dob_fallback_today);

        let state = turn(&finder, ConversationState::new(), "I'm Ada").await.unwrap();
        assert_eq!(state.user().unwrap().date_of_birth, Some(date(2026, 10, 18)));

        // the fallback counts as known, so a later real date does not replace it
        let state = turn(&finder, state, "born 1990-05-12").await.unwrap();
        assert_eq!(state.user().unwrap().date_of_birth, Some(date(2026, 10, 18)));
    }

    #[tokio::test]
    async fn test_complete_car_block_appends_one_goal() {
        let finder = strict_finder(&[CAR_BLOCK]);

        let state = turn(&finder, ConversationState::new(), "I want an estate car next March")
            .await
            .unwrap();
        let goals = &state.user().unwrap().goals;

        assert_eq!(goals.len(), 1);
        assert_eq!(goals[0].goal_type, GoalType::NewCar);
        assert_eq!(goals[0].goal_name, "New Car");
        assert_eq!(
            goals[0].goal_specific_information,
            GoalSpecificInformation::NewCar(NewCarInformation {
                car_type: "estate".to_string(),
                car_price: 18000.0,
                purchase_date: date(2026, 3, 1),
            })
        );
    }

    #[tokio::test]
    async fn test_partial_car_block_fails_turn() {
        let partial = "\"NewCarInformation\": {\n\
                       \"car_type\": \"estate\",\n\
                       \"purchase_date\": \"2026-03-01\"\n\
                       },";
        let finder = strict_finder(&["name: Ada Lovelace", partial]);

        let state = turn(&finder, ConversationState::new(), "I'm Ada").await.unwrap();

        let mut next = state.clone();
        next.push_user_message("and a car");
        let err = finder.chat_response(&next).await.unwrap_err();

        assert!(matches!(
            err,
            FactFindError::MissingGoalField {
                goal: "NewCarInformation",
                field: "car_price"
            }
        ));
        assert!(next.user().unwrap().goals.is_empty());
    }

    #[tokio::test]
    async fn test_empty_car_block_is_ignored() {
        let finder = strict_finder(&["\"NewCarInformation\": {},\nemail: ada@example.com"]);

        let state = turn(&finder, ConversationState::new(), "hello").await.unwrap();
        assert!(state.user().unwrap().goals.is_empty());
        assert_eq!(state.user().unwrap().email.as_deref(), Some("ada@example.com"));
    }

    #[tokio::test]
    async fn test_empty_home_or_other_block_fails_turn() {
        let finder = strict_finder(&[
            "\"NewHomeGoalInformation\": {},\nemail: ada@example.com",
            "\"OtherGoalInformation\": {},",
        ]);

        let result = turn(&finder, ConversationState::new(), "hello").await;
        assert!(matches!(
            result,
            Err(FactFindError::MissingGoalField {
                goal: "NewHomeGoalInformation",
                field: "location"
            })
        ));

        let result = turn(&finder, ConversationState::new(), "hello again").await;
        assert!(matches!(
            result,
            Err(FactFindError::MissingGoalField {
                goal: "OtherGoalInformation",
                field: "description"
            })
        ));
    }

    #[tokio::test]
    async fn test_goals_only_grow() {
        let other = "\"OtherGoalInformation\": {\n\"description\": \"Sabbatical\",\n\
                     \"amount_required\": 12000,\n\"target_date\": \"2028-01-01\"\n},";
        let finder = strict_finder(&[CAR_BLOCK, "Anything else?", other, "name: Ada Lovelace"]);

        let mut state = ConversationState::new();
        let mut previous = 0;
        for text in ["car", "nothing", "sabbatical", "Ada"] {
            state = turn(&finder, state, text).await.unwrap();
            let count = state.user().map_or(0, |user| user.goals.len());
            assert!(count >= previous);
            previous = count;
        }
        assert_eq!(previous, 2);
    }

    #[tokio::test]
    async fn test_turn_does_not_mutate_previous_state() {
        let finder = strict_finder(&["name: Ada Lovelace", CAR_BLOCK]);

        let first = turn(&finder, ConversationState::new(), "I'm Ada").await.unwrap();
        let second = turn(&finder, first.clone(), "car").await.unwrap();

        assert!(first.user().unwrap().goals.is_empty());
        assert_eq!(second.user().unwrap().goals.len(), 1);
    }

    #[tokio::test]
    async fn test_no_user_until_something_is_found() {
        let finder = strict_finder(&["Hello! Who am I speaking with?"]);

        let state = turn(&finder, ConversationState::new(), "hi").await.unwrap();
        assert!(state.user().is_none());
        assert!(!state.finished);
        assert_eq!(state.last_message().unwrap().text(), "Hello! Who am I speaking with?");
    }

    #[tokio::test]
    async fn test_prompt_embeds_latest_message() {
        let finder = strict_finder(&["ok"]);

        turn(&finder, ConversationState::new(), "My name is Ada Lovelace").await.unwrap();

        let prompts = finder.model().prompts();
        assert_eq!(prompts.len(), 1);
        assert!(prompts[0].ends_with("My name is Ada Lovelace"));
        assert!(prompts[0].contains("date_of_birth (YYYY-MM-DD)"));
        assert!(prompts[0].contains(
            "NewHomeGoalInformation(location, house_price, deposit_amount, \
             purchase_date (YYYY-MM-DD))"
        ));
        assert!(prompts[0].contains(
            "OtherGoalInformation(description, amount_required, target_date (YYYY-MM-DD))"
        ));
    }

    #[tokio::test]
    async fn test_empty_conversation_is_rejected() {
        let finder = strict_finder(&[]);
        let result = finder.chat_response(&ConversationState::new()).await;
        assert!(matches!(result, Err(FactFindError::EmptyConversation)));
    }

    #[tokio::test]
    async fn test_model_failure_propagates() {
        let finder = strict_finder(&[]);
        let result = turn(&finder, ConversationState::new(), "hi").await;
        assert!(matches!(result, Err(FactFindError::LlmError(_))));
    }
}
