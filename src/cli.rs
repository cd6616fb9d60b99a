//! CLI: stdin/stdout REPL for local conversations.

use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt};

use crate::agent::Agent;
use crate::context::TurnContext;

const PROMPT: &str = "User: ";
const QUIT: &str = "/quit";

/// Run the REPL until EOF or `/quit`.
///
/// Each non-empty line is one turn; the tool called and the final answer are
/// written to `output`.
pub async fn run_repl<R, W>(agent: &Agent, input: R, mut output: W) -> std::io::Result<()>
where
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin,
{
    let mut lines = input.lines();

    loop {
        output.write_all(PROMPT.as_bytes()).await?;
        output.flush().await?;

        let Some(line) = lines.next_line().await? else {
            break; // EOF
        };
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        if line == QUIT {
            break;
        }

        let result = agent
            .respond(line, TurnContext::new("local-user", "cli"))
            .await;
        let answer = result.response.as_deref().unwrap_or_default();
        output
            .write_all(format!("TOOL CALLED: {}\nANSWER: {}\n\n", result.tool_name, answer).as_bytes())
            .await?;
    }

    output.flush().await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agent::AgentDeps;
    use crate::config::AgentConfig;
    use crate::error::LlmError;
    use crate::llm::{
        CompletionRequest, CompletionResponse, FinishReason, LlmProvider, ToolCompletionRequest,
        ToolCompletionResponse,
    };
    use crate::tools::ToolRegistry;
    use async_trait::async_trait;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Echoes the last user message back as the answer.
    struct EchoLlm {
        calls: AtomicUsize,
    }

    #[async_trait]
    impl LlmProvider for EchoLlm {
        fn model_name(&self) -> &str {
            "echo"
        }

        async fn complete(
            &self,
            request: CompletionRequest,
        ) -> Result<CompletionResponse, LlmError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            let last = request.messages.last().map(|m| m.content.clone());
            Ok(CompletionResponse {
                content: format!("you said {}", last.unwrap_or_default()),
                input_tokens: 0,
                output_tokens: 0,
                finish_reason: FinishReason::Stop,
            })
        }

        async fn complete_with_tools(
            &self,
            _request: ToolCompletionRequest,
        ) -> Result<ToolCompletionResponse, LlmError> {
            unimplemented!("registry is empty")
        }
    }

    fn echo_agent() -> (Agent, Arc<EchoLlm>) {
        let llm = Arc::new(EchoLlm {
            calls: AtomicUsize::new(0),
        });
        let deps = AgentDeps {
            llm: llm.clone(),
            tools: Arc::new(ToolRegistry::new()),
        };
        (Agent::new(AgentConfig::default(), deps), llm)
    }

    #[tokio::test]
    async fn test_repl_prints_tool_and_answer() {
        let (agent, _) = echo_agent();
        let mut out = Vec::new();

        run_repl(&agent, &b"hello\n"[..], &mut out).await.unwrap();

        let text = String::from_utf8(out).unwrap();
        assert!(text.starts_with("User: "));
        assert!(text.contains("TOOL CALLED: None\nANSWER: you said hello\n"));
    }

    #[tokio::test]
    async fn test_repl_skips_blank_lines_and_stops_on_quit() {
        let (agent, llm) = echo_agent();
        let mut out = Vec::new();

        run_repl(&agent, &b"\n   \nfirst\n/quit\nnever\n"[..], &mut out)
            .await
            .unwrap();

        assert_eq!(llm.calls.load(Ordering::SeqCst), 1);
        let text = String::from_utf8(out).unwrap();
        assert!(!text.contains("never"));
    }
}
