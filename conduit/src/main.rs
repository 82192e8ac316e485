#![allow(clippy::must_use_candidate, clippy::missing_errors_doc)]

mod args;

use std::io::Write;

use args::{Args, Command};
use clap::Parser;
use conduit_config::{Config, ProviderProfile};
use conduit_llm::{
    AggregateResult, ChatAdapter, CompletionAdapter, HttpTransport, InvokeRequest, Invocation, ModelAdapter,
    StreamAccumulator, Turn,
};
use futures_util::StreamExt;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let config = Config::load(&args.config)?;
    conduit_telemetry::init(&config.telemetry)?;

    let (name, profile) = config.provider(args.provider.as_deref())?;
    tracing::debug!(
        config_path = %args.config.display(),
        provider = name,
        model = %profile.model,
        mode = profile.mode(),
        "using provider profile"
    );

    let adapter = adapter_for(profile)?;

    match args.command {
        Command::Chat {
            system,
            stream,
            max_tokens,
            prompt,
        } => {
            let mut turns = Vec::with_capacity(2);
            if let Some(system) = system {
                turns.push(Turn::system(system));
            }
            turns.push(Turn::user(prompt));

            let mut request = InvokeRequest::new(profile.model.clone(), turns).streaming(stream);
            if let Some(max_tokens) = max_tokens {
                request = request.with_parameter("max_tokens", max_tokens);
            }

            let prompt_turns = request.turns.clone();
            let result = match adapter.invoke(&profile.credentials, request).await? {
                Invocation::Complete(result) => {
                    println!("{}", result.message.content);
                    result
                }
                Invocation::Stream(mut deltas) => {
                    let mut stdout = std::io::stdout().lock();
                    let mut accumulator = StreamAccumulator::new(profile.model.clone());

                    while let Some(delta) = deltas.next().await {
                        let delta = delta?;
                        write!(stdout, "{}", delta.message.content)?;
                        stdout.flush()?;
                        accumulator.push(delta);
                    }
                    writeln!(stdout)?;

                    accumulator.finish(prompt_turns)
                }
            };

            report(&result);
        }
        Command::Validate => {
            adapter.validate_credentials(&profile.model, &profile.credentials).await?;
            println!("credentials for provider '{name}' are valid");
        }
        Command::Tokens { prompt } => {
            let tokens = adapter.num_tokens(&profile.credentials, &[Turn::user(prompt)], &[]);
            println!("{tokens}");
        }
    }

    Ok(())
}

/// Adapter for the profile's configured mode
fn adapter_for(profile: &ProviderProfile) -> anyhow::Result<Box<dyn ModelAdapter>> {
    let transport = HttpTransport::new()?;

    Ok(match profile.mode() {
        "completion" => Box::new(CompletionAdapter::with_transport(transport)),
        _ => Box::new(ChatAdapter::with_transport(transport)),
    })
}

/// Print tool calls and usage to stderr
fn report(result: &AggregateResult) {
    for call in &result.message.tool_calls {
        eprintln!("tool call {}: {}({})", call.id, call.function.name, call.function.arguments);
    }

    let usage = result.usage;
    eprintln!(
        "model: {}, tokens: {} prompt + {} completion = {} total",
        result.model, usage.prompt_tokens, usage.completion_tokens, usage.total_tokens
    );
}
