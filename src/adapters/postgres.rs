//! PostgreSQL adapter implementing both storage seams.
//!
//! Read failures map to `LedgerRead` (fatal for the pass), write failures to
//! `PersistenceWrite` (recovered by the engine as `success=false`).

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::postgres::{PgPool, PgPoolOptions, PgRow};
use sqlx::Row;
use tracing::{debug, info, instrument};
use uuid::Uuid;

use crate::domain::{
    AgentState, BettingPattern, ConversationDeltas, ConversationStats, FinalOutcome, MessageStamp,
    PredictionInfo, RiskLevel, Sport, Suggestion, SuggestionResult, UserAction, UserProfile,
    UserStats,
};
use crate::error::{MaxError, Result};
use crate::storage::{Ledger, StatsStore};

/// PostgreSQL storage adapter
#[derive(Clone)]
pub struct PostgresStore {
    pool: PgPool,
}

impl PostgresStore {
    /// Create a new PostgreSQL store
    pub async fn new(database_url: &str, max_connections: u32) -> Result<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .connect(database_url)
            .await?;

        info!("Connected to PostgreSQL");
        Ok(Self { pool })
    }

    /// Create a PostgreSQL store from an existing connection pool
    pub fn from_pool(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Run migrations
    pub async fn migrate(&self) -> Result<()> {
        sqlx::migrate!("./migrations").run(&self.pool).await?;
        info!("Database migrations completed");
        Ok(())
    }

    /// Get the connection pool
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

fn map_suggestion(row: &PgRow) -> Suggestion {
    Suggestion {
        id: row.get("id"),
        user_id: row.get("user_id"),
        sport: Sport::from(row.get::<String, _>("sport").as_str()),
        legacy_prediction_id: row.get("legacy_prediction_id"),
        suggested_stake: row.get("suggested_stake"),
        actual_stake_used: row.get("actual_stake_used"),
        timestamp: row.get("created_at"),
        user_action: row
            .get::<Option<String>, _>("user_action")
            .and_then(|s| UserAction::try_from(s.as_str()).ok()),
        agent_state_when_suggested: AgentState::try_from(
            row.get::<String, _>("agent_state_when_suggested").as_str(),
        )
        .unwrap_or_default(),
    }
}

fn map_result(row: &PgRow) -> SuggestionResult {
    SuggestionResult {
        id: row.get("id"),
        suggestion_id: row.get("suggestion_id"),
        // Unknown outcome text reads as still pending
        final_outcome: FinalOutcome::try_from(row.get::<String, _>("final_outcome").as_str())
            .unwrap_or(FinalOutcome::Pending),
        profit_loss: row.get("profit_loss"),
        result_timestamp: row.get("result_at"),
    }
}

fn map_user_stats(row: &PgRow) -> UserStats {
    UserStats {
        user_id: row.get("user_id"),
        total_amount_spent: row.get("total_amount_spent"),
        total_bets: row.get("total_bets"),
        wins: row.get("wins"),
        net_profit_loss: row.get("net_profit_loss"),
        average_stake_size: row.get("average_stake_size"),
        win_rate: row.get("win_rate"),
        roi_percentage: row.get("roi_percentage"),
        betting_frequency: row.get("betting_frequency"),
        favorite_sports: row.get("favorite_sports"),
        favorite_markets: row.get("favorite_markets"),
        betting_pattern: BettingPattern::try_from(
            row.get::<String, _>("betting_pattern").as_str(),
        )
        .unwrap_or_default(),
        preferred_stake_min: row.get("preferred_stake_min"),
        preferred_stake_max: row.get("preferred_stake_max"),
        player_persona: row.get("player_persona"),
        session_count: row.get("session_count"),
        avg_session_duration_minutes: row.get("avg_session_duration_minutes"),
        total_engagement_minutes: row.get("total_engagement_minutes"),
        days_since_last_session: row.get("days_since_last_session"),
        conversation_frequency: row.get("conversation_frequency"),
        response_rate: row.get("response_rate"),
        momentum_score: row.get("momentum_score"),
        loss_chasing_index: row.get("loss_chasing_index"),
        churn_risk: row.get("churn_risk"),
        risk_level: RiskLevel::try_from(row.get::<String, _>("risk_level").as_str())
            .unwrap_or_default(),
        current_agent_state: AgentState::try_from(
            row.get::<String, _>("current_agent_state").as_str(),
        )
        .unwrap_or_default(),
        recommended_agent_state: AgentState::try_from(
            row.get::<String, _>("recommended_agent_state").as_str(),
        )
        .unwrap_or_default(),
        updated_at: row.get("updated_at"),
    }
}

fn map_conversation_stats(row: &PgRow) -> ConversationStats {
    ConversationStats {
        user_id: row.get("user_id"),
        confidence_level: row.get("confidence_level"),
        empathy_level: row.get("empathy_level"),
        trust_indicators: row.get("trust_indicators"),
        engagement_score: row.get("engagement_score"),
        trust_score: row.get("trust_score"),
        suggestion_acceptance_rate: row.get("suggestion_acceptance_rate"),
        suggestion_success_rate: row.get("suggestion_success_rate"),
        missed_opportunity_value: row.get("missed_opportunity_value"),
        sentiment_trend: row.get("sentiment_trend"),
        updated_at: row.get("updated_at"),
    }
}

#[async_trait]
impl Ledger for PostgresStore {
    async fn get_user_profile(&self, user_id: Uuid) -> Result<UserProfile> {
        let row = sqlx::query(
            r#"
            SELECT id, display_name, created_at
            FROM users WHERE id = $1
            "#,
        )
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(MaxError::LedgerRead)?;

        let row = row.ok_or(MaxError::UserNotFound(user_id))?;
        Ok(UserProfile {
            user_id: row.get("id"),
            display_name: row.get("display_name"),
            created_at: row.get("created_at"),
        })
    }

    async fn get_suggestions(
        &self,
        user_id: Uuid,
        since: DateTime<Utc>,
    ) -> Result<Vec<Suggestion>> {
        let rows = sqlx::query(
            r#"
            SELECT id, user_id, sport, legacy_prediction_id, suggested_stake,
                   actual_stake_used, created_at, user_action, agent_state_when_suggested
            FROM suggestions
            WHERE user_id = $1 AND created_at >= $2
            ORDER BY created_at ASC
            "#,
        )
        .bind(user_id)
        .bind(since)
        .fetch_all(&self.pool)
        .await
        .map_err(MaxError::LedgerRead)?;

        Ok(rows.iter().map(map_suggestion).collect())
    }

    async fn get_results(&self, suggestion_ids: &[Uuid]) -> Result<Vec<SuggestionResult>> {
        if suggestion_ids.is_empty() {
            return Ok(Vec::new());
        }

        let rows = sqlx::query(
            r#"
            SELECT id, suggestion_id, final_outcome, profit_loss, result_at
            FROM suggestion_results
            WHERE suggestion_id = ANY($1)
            "#,
        )
        .bind(suggestion_ids)
        .fetch_all(&self.pool)
        .await
        .map_err(MaxError::LedgerRead)?;

        Ok(rows.iter().map(map_result).collect())
    }

    async fn get_message_log(
        &self,
        user_id: Uuid,
        since: DateTime<Utc>,
    ) -> Result<Vec<MessageStamp>> {
        let rows = sqlx::query(
            r#"
            SELECT session_id, created_at
            FROM chat_messages
            WHERE user_id = $1 AND created_at >= $2
            ORDER BY created_at ASC
            "#,
        )
        .bind(user_id)
        .bind(since)
        .fetch_all(&self.pool)
        .await
        .map_err(MaxError::LedgerRead)?;

        Ok(rows
            .iter()
            .map(|row| MessageStamp {
                session_id: row.get("session_id"),
                timestamp: row.get("created_at"),
            })
            .collect())
    }

    async fn resolve_prediction(&self, sport: Sport, legacy_id: &str) -> Result<PredictionInfo> {
        let row = sqlx::query(
            r#"
            SELECT odds, market
            FROM predictions
            WHERE sport = $1 AND legacy_id = $2
            "#,
        )
        .bind(sport.as_str())
        .bind(legacy_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(MaxError::LedgerRead)?;

        match row {
            Some(row) => Ok(PredictionInfo {
                odds: row.get("odds"),
                market: row.get("market"),
            }),
            None => Err(MaxError::PredictionResolution(format!(
                "no prediction record for {sport}/{legacy_id}"
            ))),
        }
    }
}

#[async_trait]
impl StatsStore for PostgresStore {
    async fn load_user_stats(&self, user_id: Uuid) -> Result<Option<UserStats>> {
        let row = sqlx::query("SELECT * FROM user_stats WHERE user_id = $1")
            .bind(user_id)
            .fetch_optional(&self.pool)
            .await
            .map_err(MaxError::LedgerRead)?;

        Ok(row.as_ref().map(map_user_stats))
    }

    async fn load_conversation_stats(&self, user_id: Uuid) -> Result<Option<ConversationStats>> {
        let row = sqlx::query("SELECT * FROM conversation_stats WHERE user_id = $1")
            .bind(user_id)
            .fetch_optional(&self.pool)
            .await
            .map_err(MaxError::LedgerRead)?;

        Ok(row.as_ref().map(map_conversation_stats))
    }

    /// Both rows commit or neither does: a reader must never see fresh risk
    /// fields next to stale financial ones. The transaction rolls back on
    /// drop if either statement fails.
    #[instrument(skip(self, user_stats, conversation_stats))]
    async fn upsert_stats(
        &self,
        user_id: Uuid,
        user_stats: &UserStats,
        conversation_stats: &ConversationStats,
    ) -> Result<()> {
        let mut tx = self.pool.begin().await.map_err(MaxError::PersistenceWrite)?;

        sqlx::query(
            r#"
            INSERT INTO user_stats (
                user_id, total_amount_spent, total_bets, wins, net_profit_loss,
                average_stake_size, win_rate, roi_percentage, betting_frequency,
                favorite_sports, favorite_markets, betting_pattern,
                preferred_stake_min, preferred_stake_max, player_persona,
                session_count, avg_session_duration_minutes, total_engagement_minutes,
                days_since_last_session, conversation_frequency, response_rate,
                momentum_score, loss_chasing_index, churn_risk, risk_level,
                current_agent_state, recommended_agent_state, updated_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14,
                    $15, $16, $17, $18, $19, $20, $21, $22, $23, $24, $25, $26, $27, $28)
            ON CONFLICT (user_id) DO UPDATE SET
                total_amount_spent = EXCLUDED.total_amount_spent,
                total_bets = EXCLUDED.total_bets,
                wins = EXCLUDED.wins,
                net_profit_loss = EXCLUDED.net_profit_loss,
                average_stake_size = EXCLUDED.average_stake_size,
                win_rate = EXCLUDED.win_rate,
                roi_percentage = EXCLUDED.roi_percentage,
                betting_frequency = EXCLUDED.betting_frequency,
                favorite_sports = EXCLUDED.favorite_sports,
                favorite_markets = EXCLUDED.favorite_markets,
                betting_pattern = EXCLUDED.betting_pattern,
                preferred_stake_min = EXCLUDED.preferred_stake_min,
                preferred_stake_max = EXCLUDED.preferred_stake_max,
                player_persona = EXCLUDED.player_persona,
                session_count = EXCLUDED.session_count,
                avg_session_duration_minutes = EXCLUDED.avg_session_duration_minutes,
                total_engagement_minutes = EXCLUDED.total_engagement_minutes,
                days_since_last_session = EXCLUDED.days_since_last_session,
                conversation_frequency = EXCLUDED.conversation_frequency,
                response_rate = EXCLUDED.response_rate,
                momentum_score = EXCLUDED.momentum_score,
                loss_chasing_index = EXCLUDED.loss_chasing_index,
                churn_risk = EXCLUDED.churn_risk,
                risk_level = EXCLUDED.risk_level,
                current_agent_state = EXCLUDED.current_agent_state,
                recommended_agent_state = EXCLUDED.recommended_agent_state,
                updated_at = EXCLUDED.updated_at
            "#,
        )
        .bind(user_id)
        .bind(user_stats.total_amount_spent)
        .bind(user_stats.total_bets)
        .bind(user_stats.wins)
        .bind(user_stats.net_profit_loss)
        .bind(user_stats.average_stake_size)
        .bind(user_stats.win_rate)
        .bind(user_stats.roi_percentage)
        .bind(user_stats.betting_frequency)
        .bind(&user_stats.favorite_sports)
        .bind(&user_stats.favorite_markets)
        .bind(user_stats.betting_pattern.as_str())
        .bind(user_stats.preferred_stake_min)
        .bind(user_stats.preferred_stake_max)
        .bind(&user_stats.player_persona)
        .bind(user_stats.session_count)
        .bind(user_stats.avg_session_duration_minutes)
        .bind(user_stats.total_engagement_minutes)
        .bind(user_stats.days_since_last_session)
        .bind(user_stats.conversation_frequency)
        .bind(user_stats.response_rate)
        .bind(user_stats.momentum_score)
        .bind(user_stats.loss_chasing_index)
        .bind(user_stats.churn_risk)
        .bind(user_stats.risk_level.as_str())
        .bind(user_stats.current_agent_state.as_str())
        .bind(user_stats.recommended_agent_state.as_str())
        .bind(user_stats.updated_at)
        .execute(&mut *tx)
        .await
        .map_err(MaxError::PersistenceWrite)?;

        sqlx::query(
            r#"
            INSERT INTO conversation_stats (
                user_id, confidence_level, empathy_level, trust_indicators,
                engagement_score, trust_score, suggestion_acceptance_rate,
                suggestion_success_rate, missed_opportunity_value,
                sentiment_trend, updated_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
            ON CONFLICT (user_id) DO UPDATE SET
                confidence_level = EXCLUDED.confidence_level,
                empathy_level = EXCLUDED.empathy_level,
                trust_indicators = EXCLUDED.trust_indicators,
                engagement_score = EXCLUDED.engagement_score,
                trust_score = EXCLUDED.trust_score,
                suggestion_acceptance_rate = EXCLUDED.suggestion_acceptance_rate,
                suggestion_success_rate = EXCLUDED.suggestion_success_rate,
                missed_opportunity_value = EXCLUDED.missed_opportunity_value,
                sentiment_trend = EXCLUDED.sentiment_trend,
                updated_at = EXCLUDED.updated_at
            "#,
        )
        .bind(user_id)
        .bind(conversation_stats.confidence_level)
        .bind(conversation_stats.empathy_level)
        .bind(conversation_stats.trust_indicators)
        .bind(conversation_stats.engagement_score)
        .bind(conversation_stats.trust_score)
        .bind(conversation_stats.suggestion_acceptance_rate)
        .bind(conversation_stats.suggestion_success_rate)
        .bind(conversation_stats.missed_opportunity_value)
        .bind(&conversation_stats.sentiment_trend)
        .bind(conversation_stats.updated_at)
        .execute(&mut *tx)
        .await
        .map_err(MaxError::PersistenceWrite)?;

        tx.commit().await.map_err(MaxError::PersistenceWrite)?;
        debug!(%user_id, "stats upsert committed");
        Ok(())
    }

    #[instrument(skip(self, deltas))]
    async fn apply_conversation_deltas(
        &self,
        user_id: Uuid,
        deltas: &ConversationDeltas,
    ) -> Result<ConversationStats> {
        let now = Utc::now();
        let mut tx = self.pool.begin().await.map_err(MaxError::PersistenceWrite)?;

        let row = sqlx::query("SELECT * FROM conversation_stats WHERE user_id = $1 FOR UPDATE")
            .bind(user_id)
            .fetch_optional(&mut *tx)
            .await
            .map_err(MaxError::PersistenceWrite)?;

        let mut stats = row
            .as_ref()
            .map(map_conversation_stats)
            .unwrap_or_else(|| ConversationStats::seed(user_id, now));
        stats.apply_deltas(deltas, now);

        sqlx::query(
            r#"
            INSERT INTO conversation_stats (
                user_id, confidence_level, empathy_level, trust_indicators,
                engagement_score, trust_score, suggestion_acceptance_rate,
                suggestion_success_rate, missed_opportunity_value,
                sentiment_trend, updated_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
            ON CONFLICT (user_id) DO UPDATE SET
                confidence_level = EXCLUDED.confidence_level,
                empathy_level = EXCLUDED.empathy_level,
                trust_indicators = EXCLUDED.trust_indicators,
                engagement_score = EXCLUDED.engagement_score,
                sentiment_trend = EXCLUDED.sentiment_trend,
                updated_at = EXCLUDED.updated_at
            "#,
        )
        .bind(user_id)
        .bind(stats.confidence_level)
        .bind(stats.empathy_level)
        .bind(stats.trust_indicators)
        .bind(stats.engagement_score)
        .bind(stats.trust_score)
        .bind(stats.suggestion_acceptance_rate)
        .bind(stats.suggestion_success_rate)
        .bind(stats.missed_opportunity_value)
        .bind(&stats.sentiment_trend)
        .bind(stats.updated_at)
        .execute(&mut *tx)
        .await
        .map_err(MaxError::PersistenceWrite)?;

        tx.commit().await.map_err(MaxError::PersistenceWrite)?;
        debug!(%user_id, "conversation deltas applied");
        Ok(stats)
    }
}
