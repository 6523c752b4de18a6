use thiserror::Error;

/// Failures the orchestrator recovers into a user-facing reply.
///
/// Ambiguous matches are deliberately not an error: they surface as a
/// `ClarificationRequest` instead.
#[derive(Debug, Error)]
pub enum OrchestratorError {
    #[error("could not extract food items from input")]
    ParseFailure,

    #[error("no nutrition match for '{0}'")]
    LookupEmpty(String),

    #[error("clarification round limit exceeded")]
    ClarificationExhausted,

    #[error("persistence failure: {0}")]
    PersistenceFailure(#[source] anyhow::Error),

    #[error("all language model providers failed")]
    GatewayUnavailable,
}

impl OrchestratorError {
    /// Text sent back to the user when this failure ends the turn.
    pub fn user_reply(&self) -> String {
        match self {
            Self::ParseFailure => {
                "Не смог разобрать, что вы съели. Попробуйте переформулировать, \
                 например: 'съел 150г гречки'"
                    .into()
            }
            Self::LookupEmpty(name) => {
                format!(
                    "Не нашел '{name}' в базе. Попробуйте переформулировать запрос \
                     или укажите КБЖУ вручную, например: \
                     '150г {name} БЖУ 10/5/20 калорий 150'"
                )
            }
            Self::ClarificationExhausted => {
                "Извините, не получилось уточнить детали. Попробуйте записать заново одним \
                 сообщением, например: 'съел 150г варёной гречки'"
                    .into()
            }
            Self::PersistenceFailure(_) => {
                "Не удалось сохранить запись. Попробуйте еще раз через минуту.".into()
            }
            Self::GatewayUnavailable => {
                "Извините, произошла ошибка. Попробуйте еще раз.".into()
            }
        }
    }
}
