use std::sync::Arc;

use lazy_static::lazy_static;
use regex::Regex;
use time::OffsetDateTime;
use tracing::{error, info, instrument, warn};
use uuid::Uuid;

use crate::config::OrchestratorConfig;
use crate::error::OrchestratorError;
use crate::foodlog::{
    report as diary,
    totals::{daily_totals, period_totals},
    FoodLogStore, NewFoodLogEntry, PeriodTotals,
};
use crate::llm::types::RawLabel;
use crate::llm::{ImageExtraction, Intent, LlmGateway};
use crate::nutrition::{CustomNutrition, NutritionLookup, ServingOption};
use crate::sessions::SessionStore;

use super::intent;
use super::parser;
use super::report;
use super::serving::{self, ServingSelection};
use super::state::{
    self, ClarificationKind, ClarificationRequest, ConversationState, ItemStatus, ParsedFoodItem,
    Phase,
};

const MAX_FOOD_OPTIONS: usize = 5;
const SEARCH_MAX_RESULTS: u32 = 10;

/// Escape option appended to a food selection when more candidates exist
/// than fit on one page; picking it rotates to the next page.
const SHOW_MORE_OPTION: &str = "Ничего не подходит, показать ещё";

/// One inbound user message.
#[derive(Debug, Clone)]
pub struct TurnInput {
    pub user_id: Uuid,
    pub text: Option<String>,
    pub photo_b64: Option<String>,
    pub message_id: i64,
}

/// Everything the transport layer needs to answer one turn.
#[derive(Debug, Clone, serde::Serialize)]
pub struct TurnOutcome {
    pub conversation_id: Uuid,
    pub reply_text: String,
    pub needs_clarification: bool,
    pub clarification: Option<ClarificationRequest>,
    pub saved_entry_ids: Vec<Uuid>,
    pub period_totals: Option<PeriodTotals>,
}

impl TurnOutcome {
    fn reply(conversation_id: Uuid, reply_text: String) -> Self {
        Self {
            conversation_id,
            reply_text,
            needs_clarification: false,
            clarification: None,
            saved_entry_ids: Vec::new(),
            period_totals: None,
        }
    }
}

/// Per-item progress inside the resolution loop.
enum ItemProgress {
    Saved(Uuid),
    NeedsChoice(ClarificationRequest),
    NotFound,
}

enum AnswerOutcome {
    Applied,
    NotUnderstood,
}

/// Drives a message through intent classification, parsing, clarification
/// and nutrition resolution. Holds no per-conversation state itself; all of
/// that lives in the session store so any instance can pick up any turn.
pub struct Orchestrator {
    gateway: Arc<LlmGateway>,
    lookup: Arc<dyn NutritionLookup>,
    sessions: Arc<dyn SessionStore>,
    food_log: Arc<dyn FoodLogStore>,
    limits: OrchestratorConfig,
}

impl Orchestrator {
    pub fn new(
        gateway: Arc<LlmGateway>,
        lookup: Arc<dyn NutritionLookup>,
        sessions: Arc<dyn SessionStore>,
        food_log: Arc<dyn FoodLogStore>,
        limits: OrchestratorConfig,
    ) -> Self {
        Self {
            gateway,
            lookup,
            sessions,
            food_log,
            limits,
        }
    }

    /// Entry point for one user message. Never fails: every failure mode is
    /// folded into a user-facing reply.
    #[instrument(skip(self, input), fields(user_id = %input.user_id, message_id = input.message_id))]
    pub async fn handle_turn(&self, input: TurnInput) -> TurnOutcome {
        if let Some(conv) = state::load_active(self.sessions.as_ref(), input.user_id).await {
            if conv.phase == Phase::AwaitingClarification {
                if let Some(pending) = conv.pending.clone() {
                    let answer = input.text.clone().unwrap_or_default();
                    if input.photo_b64.is_none() && is_answer_shaped(&answer, &pending) {
                        return self.continue_conversation(conv, pending, &answer).await;
                    }
                    info!(
                        conversation_id = %conv.id,
                        "message does not answer the pending question, starting fresh"
                    );
                }
            }
            // Stale or abandoned conversation; only one can be active.
            state::clear(self.sessions.as_ref(), &conv).await;
        }
        self.start_turn(input).await
    }

    async fn start_turn(&self, input: TurnInput) -> TurnOutcome {
        let user_id = input.user_id;

        // Photos always mean "log this food"; classification is skipped.
        if let Some(photo) = &input.photo_b64 {
            return match self.gateway.extract_from_image(photo).await {
                Ok(ImageExtraction::Meal(description)) => {
                    info!(user_id = %user_id, "photo recognized as food description");
                    self.start_food_entry(user_id, &description).await
                }
                Ok(ImageExtraction::Label(label)) => {
                    info!(user_id = %user_id, "photo recognized as nutrition label");
                    self.start_label_entry(user_id, label).await
                }
                Err(e) => {
                    warn!(error = %e, "image recognition failed");
                    TurnOutcome::reply(
                        Uuid::new_v4(),
                        OrchestratorError::GatewayUnavailable.user_reply(),
                    )
                }
            };
        }

        let text = input.text.unwrap_or_default();
        let classified = intent::classify(&self.gateway, &text).await;
        match classified.intent {
            Intent::FoodEntry => self.start_food_entry(user_id, &text).await,
            Intent::ViewReport => self.run_report(user_id, &text).await,
            Intent::Question | Intent::Chat => {
                let reply = match self.gateway.generate_reply(&text, classified.intent).await {
                    Ok(reply) => reply,
                    Err(e) => {
                        warn!(error = %e, "reply generation failed");
                        OrchestratorError::GatewayUnavailable.user_reply()
                    }
                };
                TurnOutcome::reply(Uuid::new_v4(), reply)
            }
        }
    }

    async fn start_food_entry(&self, user_id: Uuid, text: &str) -> TurnOutcome {
        let items = match parser::parse_food_text(&self.gateway, text).await {
            Ok(items) => items,
            Err(e) => return TurnOutcome::reply(Uuid::new_v4(), e.user_reply()),
        };
        let mut conv = ConversationState::new(user_id, Intent::FoodEntry, text);
        conv.items = items;
        self.advance(conv, Vec::new()).await
    }

    /// Log a food from its label photo: the printed per-100g values become
    /// the entry's nutrition, only the eaten weight is asked for.
    async fn start_label_entry(&self, user_id: Uuid, label: RawLabel) -> TurnOutcome {
        let name = match (label.product_name.as_deref(), label.brand.as_deref()) {
            (Some(product), Some(brand)) => format!("{product} ({brand})"),
            (Some(product), None) => product.to_string(),
            _ => "Продукт с этикетки".to_string(),
        };
        let values = label.nutrition_per_100g;
        let Some(calories) = values.calories else {
            return TurnOutcome::reply(Uuid::new_v4(), OrchestratorError::ParseFailure.user_reply());
        };

        let mut item = ParsedFoodItem {
            raw_name: name.clone(),
            name_en: None,
            quantity: None,
            unit: Some("g".into()),
            cooking_method: None,
            status: ItemStatus::Pending,
            custom_nutrition: Some(CustomNutrition {
                calories,
                protein: values.protein,
                fat: values.fat,
                carbohydrate: values.carbs,
                per_100g: true,
            }),
            candidates: Vec::new(),
            candidate_page: 0,
            chosen: None,
            servings: Vec::new(),
            chosen_serving: None,
        };
        parser::refresh_status(&mut item);

        let mut conv =
            ConversationState::new(user_id, Intent::FoodEntry, &format!("фото этикетки: {name}"));
        conv.items = vec![item];
        self.advance(conv, Vec::new()).await
    }

    /// Push the conversation as far as it can go without user input: ask the
    /// next missing-info question, or resolve items in parse order until one
    /// needs a selection or everything is done.
    async fn advance(&self, mut conv: ConversationState, mut saved: Vec<Uuid>) -> TurnOutcome {
        if let Some(idx) = conv.first_needing_clarification() {
            let request = missing_info_question(&conv.items[idx], idx);
            return self.ask(conv, request, saved).await;
        }

        conv.phase = Phase::Resolving;
        let mut failed: Vec<String> = Vec::new();
        while let Some(idx) = conv.first_unresolved() {
            match self.resolve_item(&mut conv, idx).await {
                Ok(ItemProgress::Saved(entry_id)) => {
                    conv.items[idx].status = ItemStatus::Resolved;
                    saved.push(entry_id);
                }
                Ok(ItemProgress::NeedsChoice(request)) => {
                    return self.ask(conv, request, saved).await;
                }
                Ok(ItemProgress::NotFound) => {
                    conv.items[idx].status = ItemStatus::Failed;
                    failed.push(conv.items[idx].raw_name.clone());
                }
                Err(e) => {
                    error!(error = %e, item = %conv.items[idx].raw_name, "item resolution failed");
                    state::clear(self.sessions.as_ref(), &conv).await;
                    let mut outcome = TurnOutcome::reply(conv.id, e.user_reply());
                    outcome.saved_entry_ids = saved;
                    return outcome;
                }
            }
        }

        conv.phase = Phase::Resolved;
        state::clear(self.sessions.as_ref(), &conv).await;
        let reply = self.resolved_reply(&conv, &failed).await;
        let mut outcome = TurnOutcome::reply(conv.id, reply);
        outcome.saved_entry_ids = saved;
        outcome
    }

    /// Resolve one item against the nutrition database, saving an entry when
    /// the serving is unambiguous and raising a selection question otherwise.
    async fn resolve_item(
        &self,
        conv: &mut ConversationState,
        idx: usize,
    ) -> Result<ItemProgress, OrchestratorError> {
        // User-stated or label nutrition needs no database lookup at all.
        if let Some(custom) = conv.items[idx].custom_nutrition.clone() {
            let quantity = conv.items[idx]
                .quantity
                .ok_or(OrchestratorError::ParseFailure)?;
            let entry_id = self.persist_custom_entry(conv, idx, &custom, quantity).await?;
            return Ok(ItemProgress::Saved(entry_id));
        }

        if conv.items[idx].chosen.is_none() {
            if conv.items[idx].candidates.is_empty() {
                let query = self.search_query(&conv.items[idx]).await;
                let mut candidates = self.lookup.search(&query, SEARCH_MAX_RESULTS).await;
                if candidates.is_empty() {
                    // "boiled buckwheat" may miss where plain "buckwheat" hits.
                    if let Some((_, broader)) = query.rsplit_once(' ') {
                        info!(%query, broader, "retrying lookup with broader term");
                        candidates = self.lookup.search(broader, SEARCH_MAX_RESULTS).await;
                    }
                }
                if candidates.is_empty() {
                    return Ok(ItemProgress::NotFound);
                }
                if candidates.len() == 1 {
                    conv.items[idx].chosen = Some(candidates.remove(0));
                } else {
                    conv.items[idx].candidates = candidates;
                }
            }
            if conv.items[idx].chosen.is_none() {
                return Ok(ItemProgress::NeedsChoice(food_selection_question(
                    &conv.items[idx],
                    idx,
                )));
            }
        }

        let chosen = conv.items[idx]
            .chosen
            .clone()
            .ok_or(OrchestratorError::ParseFailure)?;

        if let Some(chosen_serving) = conv.items[idx].chosen_serving.clone() {
            let count = explicit_serving_count(&conv.items[idx], &chosen_serving);
            let entry_id = self
                .persist_entry(conv, idx, &chosen_serving, count)
                .await?;
            return Ok(ItemProgress::Saved(entry_id));
        }

        let servings = if conv.items[idx].servings.is_empty() {
            self.lookup.get_servings(&chosen.food_id).await
        } else {
            conv.items[idx].servings.clone()
        };
        if servings.is_empty() {
            return Ok(ItemProgress::NotFound);
        }

        let quantity = conv.items[idx].quantity;
        let unit = conv.items[idx].unit.clone();
        match serving::select_serving(&servings, quantity, unit.as_deref()) {
            ServingSelection::Picked {
                serving,
                number_of_servings,
            } => {
                let entry_id = self
                    .persist_entry(conv, idx, &serving, number_of_servings)
                    .await?;
                Ok(ItemProgress::Saved(entry_id))
            }
            ServingSelection::Ambiguous { options } => {
                conv.items[idx].servings = servings;
                Ok(ItemProgress::NeedsChoice(ClarificationRequest {
                    kind: ClarificationKind::ServingSelection,
                    question: format!("Какая порция для '{}'?", conv.items[idx].raw_name),
                    options,
                    item_index: idx,
                }))
            }
        }
    }

    /// English search query for the lookup provider: translated name plus the
    /// cooking method when one is known.
    async fn search_query(&self, item: &ParsedFoodItem) -> String {
        let name = match item.name_en.as_deref() {
            Some(name) if !name.is_empty() => name.to_string(),
            _ => self.gateway.translate_to_english(&item.raw_name).await,
        };
        match item.cooking_method.as_deref() {
            Some(method) => {
                let method = self.gateway.translate_to_english(method).await;
                format!("{method} {name}")
            }
            None => name,
        }
    }

    async fn persist_entry(
        &self,
        conv: &ConversationState,
        idx: usize,
        serving: &ServingOption,
        number_of_servings: f64,
    ) -> Result<Uuid, OrchestratorError> {
        let item = &conv.items[idx];
        let chosen = item.chosen.as_ref().ok_or(OrchestratorError::ParseFailure)?;
        let entry = NewFoodLogEntry {
            user_id: conv.user_id,
            food_id: Some(chosen.food_id.clone()),
            food_name: chosen.food_name.clone(),
            brand_name: chosen.brand_name.clone(),
            serving_description: Some(serving.description.clone()),
            number_of_servings,
            nutrients: serving.nutrients.scaled(number_of_servings),
            consumed_at: OffsetDateTime::now_utc(),
            original_input: Some(conv.original_input.clone()),
        };
        let entry_id = self
            .food_log
            .create_entry(entry)
            .await
            .map_err(OrchestratorError::PersistenceFailure)?;
        info!(
            entry_id = %entry_id,
            food = %chosen.food_name,
            number_of_servings,
            "food log entry saved"
        );
        Ok(entry_id)
    }

    /// Save an entry from nutrition the user stated or a label provided.
    /// Per-100g values scale by the eaten weight; portion values are taken
    /// as given.
    async fn persist_custom_entry(
        &self,
        conv: &ConversationState,
        idx: usize,
        custom: &CustomNutrition,
        quantity: f64,
    ) -> Result<Uuid, OrchestratorError> {
        let item = &conv.items[idx];
        let unit = item.unit.clone().unwrap_or_else(|| "g".into());
        let entry = NewFoodLogEntry {
            user_id: conv.user_id,
            food_id: None,
            food_name: item.raw_name.clone(),
            brand_name: None,
            serving_description: Some(format!("{quantity}{unit}")),
            number_of_servings: 1.0,
            nutrients: custom.nutrients_for(quantity),
            consumed_at: OffsetDateTime::now_utc(),
            original_input: Some(conv.original_input.clone()),
        };
        let entry_id = self
            .food_log
            .create_entry(entry)
            .await
            .map_err(OrchestratorError::PersistenceFailure)?;
        info!(
            entry_id = %entry_id,
            food = %item.raw_name,
            per_100g = custom.per_100g,
            "custom nutrition entry saved"
        );
        Ok(entry_id)
    }

    /// Persist the question and hand the turn back to the user. Counts a
    /// clarification round; exceeding the limit aborts the conversation.
    async fn ask(
        &self,
        mut conv: ConversationState,
        request: ClarificationRequest,
        saved: Vec<Uuid>,
    ) -> TurnOutcome {
        conv.rounds += 1;
        if conv.rounds > self.limits.clarification_round_limit {
            let mut outcome = self
                .abort(conv, OrchestratorError::ClarificationExhausted)
                .await;
            outcome.saved_entry_ids = saved;
            return outcome;
        }

        conv.phase = Phase::AwaitingClarification;
        conv.pending = Some(request.clone());
        conv.retried = false;
        conv.updated_at = OffsetDateTime::now_utc();
        if let Err(e) = state::save(
            self.sessions.as_ref(),
            &conv,
            self.limits.conversation_ttl_secs,
        )
        .await
        {
            error!(error = %e, conversation_id = %conv.id, "failed to persist conversation");
        }

        TurnOutcome {
            conversation_id: conv.id,
            reply_text: format_question(&request),
            needs_clarification: true,
            clarification: Some(request),
            saved_entry_ids: saved,
            period_totals: None,
        }
    }

    async fn abort(&self, mut conv: ConversationState, e: OrchestratorError) -> TurnOutcome {
        warn!(conversation_id = %conv.id, error = %e, "conversation aborted");
        conv.phase = Phase::Aborted;
        state::clear(self.sessions.as_ref(), &conv).await;
        TurnOutcome::reply(conv.id, e.user_reply())
    }

    /// Apply an answer to the pending question and keep going. An answer we
    /// cannot interpret is re-asked once; a second failure aborts.
    async fn continue_conversation(
        &self,
        mut conv: ConversationState,
        pending: ClarificationRequest,
        answer: &str,
    ) -> TurnOutcome {
        conv.pending = None;
        match apply_answer(&mut conv, &pending, answer) {
            AnswerOutcome::Applied => {
                conv.retried = false;
                self.advance(conv, Vec::new()).await
            }
            AnswerOutcome::NotUnderstood if conv.retried => {
                self.abort(conv, OrchestratorError::ClarificationExhausted)
                    .await
            }
            AnswerOutcome::NotUnderstood => {
                conv.retried = true;
                conv.pending = Some(pending.clone());
                conv.updated_at = OffsetDateTime::now_utc();
                if let Err(e) = state::save(
                    self.sessions.as_ref(),
                    &conv,
                    self.limits.conversation_ttl_secs,
                )
                .await
                {
                    error!(error = %e, conversation_id = %conv.id, "failed to persist conversation");
                }
                TurnOutcome {
                    conversation_id: conv.id,
                    reply_text: format!("Не понял ответ.\n{}", format_question(&pending)),
                    needs_clarification: true,
                    clarification: Some(pending),
                    saved_entry_ids: Vec::new(),
                    period_totals: None,
                }
            }
        }
    }

    async fn run_report(&self, user_id: Uuid, text: &str) -> TurnOutcome {
        let period =
            report::resolve_period(&self.gateway, text, self.limits.report_all_days_cap).await;
        let today = OffsetDateTime::now_utc().date();
        let (start, end) = report::date_range(period, today);

        let entries = match self.food_log.entries_for_range(user_id, start, end).await {
            Ok(entries) => entries,
            Err(e) => {
                error!(error = %e, "report query failed");
                return TurnOutcome::reply(
                    Uuid::new_v4(),
                    OrchestratorError::PersistenceFailure(e).user_reply(),
                );
            }
        };

        let title = period.title();
        let totals = period_totals(start, end, &entries);
        let reply = if start == end {
            diary::render_daily(&title, &daily_totals(start, &entries), &entries)
        } else {
            diary::render_period(&title, &totals)
        };

        let mut outcome = TurnOutcome::reply(Uuid::new_v4(), reply);
        outcome.period_totals = Some(totals);
        outcome
    }

    /// Confirmation text after a conversation resolves: what was logged, the
    /// running total for today, and which items could not be found.
    async fn resolved_reply(&self, conv: &ConversationState, failed: &[String]) -> String {
        let mut parts = Vec::new();

        let logged: Vec<&str> = conv
            .items
            .iter()
            .filter(|i| i.status == ItemStatus::Resolved)
            .map(|i| i.raw_name.as_str())
            .collect();
        if !logged.is_empty() {
            parts.push(format!("Записал: {}", logged.join(", ")));
            let today = OffsetDateTime::now_utc().date();
            match self
                .food_log
                .entries_for_range(conv.user_id, today, today)
                .await
            {
                Ok(entries) => {
                    let totals = daily_totals(today, &entries);
                    parts.push(format!(
                        "Сегодня: {:.0} ккал, белки {:.0}г, углеводы {:.0}г, жиры {:.0}г",
                        totals.calories, totals.protein, totals.carbohydrates, totals.fat
                    ));
                }
                Err(e) => warn!(error = %e, "could not compute daily totals for reply"),
            }
        }

        for name in failed {
            parts.push(OrchestratorError::LookupEmpty(name.clone()).user_reply());
        }
        if parts.is_empty() {
            parts.push(OrchestratorError::ParseFailure.user_reply());
        }
        parts.join("\n")
    }
}

lazy_static! {
    static ref NUMBER_RE: Regex = Regex::new(r"(\d+(?:[.,]\d+)?)").unwrap();
}

fn first_number(text: &str) -> Option<f64> {
    NUMBER_RE
        .captures(text)
        .and_then(|caps| caps[1].replace(',', ".").parse().ok())
}

/// Conservative check whether a message answers the pending question rather
/// than starting something new. Numeric or option-shaped replies and short
/// phrases count; anything opening with an eating verb is a new statement.
fn is_answer_shaped(text: &str, pending: &ClarificationRequest) -> bool {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return false;
    }
    if parser::starts_with_food_verb(trimmed) {
        return false;
    }
    if match_option(trimmed, &pending.options).is_some() {
        return true;
    }
    let words = trimmed.split_whitespace().count();
    match pending.kind {
        ClarificationKind::MissingQuantity => NUMBER_RE.is_match(trimmed) && words <= 3,
        _ => words <= 3,
    }
}

/// Map an answer onto one of the offered options: a 1-based number, an exact
/// match, or a unique substring match (either direction), case-insensitive.
fn match_option(answer: &str, options: &[String]) -> Option<usize> {
    if options.is_empty() {
        return None;
    }
    let trimmed = answer.trim();
    if let Ok(n) = trimmed.trim_end_matches(['.', ')']).parse::<usize>() {
        if (1..=options.len()).contains(&n) {
            return Some(n - 1);
        }
    }
    let lower = trimmed.to_lowercase();
    if let Some(i) = options.iter().position(|o| o.to_lowercase() == lower) {
        return Some(i);
    }
    let matches: Vec<usize> = options
        .iter()
        .enumerate()
        .filter(|(_, o)| {
            let option = o.to_lowercase();
            option.contains(&lower) || lower.contains(&option)
        })
        .map(|(i, _)| i)
        .collect();
    match matches.as_slice() {
        [single] => Some(*single),
        _ => None,
    }
}

/// One page of candidates, plus the show-more escape when more exist than
/// fit on a page.
fn food_selection_question(item: &ParsedFoodItem, idx: usize) -> ClarificationRequest {
    let start = item.candidate_page * MAX_FOOD_OPTIONS;
    let mut options: Vec<String> = item
        .candidates
        .iter()
        .skip(start)
        .take(MAX_FOOD_OPTIONS)
        .map(|c| c.display_name())
        .collect();
    if item.candidates.len() > MAX_FOOD_OPTIONS {
        options.push(SHOW_MORE_OPTION.into());
    }
    ClarificationRequest {
        kind: ClarificationKind::FoodSelection,
        question: format!(
            "Нашел несколько вариантов для '{}'. Какой подходит?",
            item.raw_name
        ),
        options,
        item_index: idx,
    }
}

fn missing_info_question(item: &ParsedFoodItem, idx: usize) -> ClarificationRequest {
    match parser::missing_info(item) {
        Some(ClarificationKind::CookingMethod) => ClarificationRequest {
            kind: ClarificationKind::CookingMethod,
            question: format!(
                "'{}' - в каком виде? Например: варёная, жареная, сырая.",
                item.raw_name
            ),
            options: Vec::new(),
            item_index: idx,
        },
        _ => ClarificationRequest {
            kind: ClarificationKind::MissingQuantity,
            question: format!("Сколько '{}' вы съели? Например: 150г или 2 шт.", item.raw_name),
            options: Vec::new(),
            item_index: idx,
        },
    }
}

fn format_question(request: &ClarificationRequest) -> String {
    if request.options.is_empty() {
        return request.question.clone();
    }
    let mut lines = vec![request.question.clone()];
    for (i, option) in request.options.iter().enumerate() {
        lines.push(format!("{}. {option}", i + 1));
    }
    lines.join("\n")
}

/// Number of servings when the user picked a serving explicitly: metric
/// weights scale by the serving's metric amount, counts are taken as-is.
fn explicit_serving_count(item: &ParsedFoodItem, serving: &ServingOption) -> f64 {
    match (item.quantity, item.unit.as_deref()) {
        (Some(q), Some(u)) if matches!(serving::normalize_unit(u).as_str(), "g" | "ml") => {
            match serving.metric_amount {
                Some(amount) if amount > 0.0 => q / amount,
                _ => 1.0,
            }
        }
        (Some(q), _) => q,
        _ => 1.0,
    }
}

fn apply_answer(
    conv: &mut ConversationState,
    pending: &ClarificationRequest,
    answer: &str,
) -> AnswerOutcome {
    let Some(item) = conv.items.get_mut(pending.item_index) else {
        return AnswerOutcome::NotUnderstood;
    };
    match pending.kind {
        ClarificationKind::MissingQuantity => {
            let Some(quantity) = first_number(answer) else {
                return AnswerOutcome::NotUnderstood;
            };
            let lower = answer.to_lowercase();
            item.quantity = Some(quantity);
            item.unit = Some(if lower.contains("мл") || lower.contains("ml") {
                "ml".into()
            } else if lower.contains("шт") || lower.contains("piece") {
                "piece".into()
            } else {
                "g".into()
            });
            parser::refresh_status(item);
            AnswerOutcome::Applied
        }
        ClarificationKind::CookingMethod => {
            let trimmed = answer.trim();
            if trimmed.is_empty() || NUMBER_RE.is_match(trimmed) {
                return AnswerOutcome::NotUnderstood;
            }
            item.cooking_method = Some(trimmed.to_string());
            // The search query changed; any cached lookup is stale.
            item.candidates.clear();
            item.candidate_page = 0;
            item.chosen = None;
            item.servings.clear();
            item.chosen_serving = None;
            parser::refresh_status(item);
            AnswerOutcome::Applied
        }
        ClarificationKind::FoodSelection => {
            let Some(i) = match_option(answer, &pending.options) else {
                return AnswerOutcome::NotUnderstood;
            };
            let start = item.candidate_page * MAX_FOOD_OPTIONS;
            let shown = item
                .candidates
                .len()
                .saturating_sub(start)
                .min(MAX_FOOD_OPTIONS);
            if i >= shown {
                // The show-more escape: rotate to the next page, wrapping
                // back to the first when the list is exhausted.
                item.candidate_page = if start + MAX_FOOD_OPTIONS < item.candidates.len() {
                    item.candidate_page + 1
                } else {
                    0
                };
                return AnswerOutcome::Applied;
            }
            let Some(candidate) = item.candidates.get(start + i).cloned() else {
                return AnswerOutcome::NotUnderstood;
            };
            item.chosen = Some(candidate);
            AnswerOutcome::Applied
        }
        ClarificationKind::ServingSelection => {
            let Some(i) = match_option(answer, &pending.options) else {
                return AnswerOutcome::NotUnderstood;
            };
            let description = &pending.options[i];
            let Some(serving) = item
                .servings
                .iter()
                .find(|s| &s.description == description)
                .cloned()
            else {
                return AnswerOutcome::NotUnderstood;
            };
            item.chosen_serving = Some(serving);
            AnswerOutcome::Applied
        }
    }
}
