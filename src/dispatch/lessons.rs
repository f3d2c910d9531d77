use crate::builtin::ChatSessionOptions;
use crate::capability::Capability;
use crate::errors::{AiError, LocalError};
use crate::lessons::{
    LESSON_SCHEMA, LessonItem, LessonModule, remote_prompt, remote_system_prompt, tutor_prompt,
    tutor_system_prompt,
};
use crate::providers::PromptRequest;
use crate::session::SessionKey;
use crate::structured::parse_structured;

use super::{FallbackDispatcher, LocalOutcome, settle};

impl FallbackDispatcher {
    /// Generate the questions of one course module in `language_code`
    ///
    /// On-device generation runs in a tutor session per language, constrained
    /// to the lesson schema. Output that does not parse counts as an on-device
    /// failure; from the remote proxy it is `AiError::MalformedOutput`.
    pub async fn generate_module_lessons(
        &self,
        language_code: &str,
        module: &LessonModule,
    ) -> Result<Vec<LessonItem>, AiError> {
        let state = self.probe(Capability::Prompt).await;
        let outcome = LocalOutcome::attempt(state, || async {
            let options = ChatSessionOptions::new(tutor_system_prompt(language_code));
            let monitor = self.sessions.download_monitor();
            let session = self
                .sessions
                .tutors()
                .get_or_create(&SessionKey::new(language_code), || {
                    self.device.prompt.create(&options, monitor)
                })
                .await?;

            let answer = session.prompt(&tutor_prompt(module), Some(&*LESSON_SCHEMA)).await?;
            parse_structured::<Vec<LessonItem>>(&answer)
                .map_err(|e| LocalError::operation(Capability::Prompt, e))
        })
        .await;

        settle(Capability::Prompt, outcome, || async {
            let request = PromptRequest::new(remote_prompt(module))
                .system(remote_system_prompt(language_code, module));
            let answer = self.remote.prompt(&request).await?;
            Ok::<_, AiError>(parse_structured(&answer)?)
        })
        .await
    }
}
