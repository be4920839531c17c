use loan_assistant_client::{
    chat::{self, ChatFlow, SendOutcome},
    config::ClientConfig,
    prediction::{render, PredictionFlow, SubmitOutcome},
    transport::HttpTransport,
    Result,
};
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::info;
use tracing_subscriber::EnvFilter;

const HELP: &str = "\
Loan Approval & Interest Rate Predictor
  set <field> <value>   credit_score | annual_income | requested_amount
  form                  show the form and the latest result
  predict               submit the form
  open | close          show or hide the loan assistant
  chat <message>        ask the loan assistant (panel must be open)
  history               print the conversation so far
  help                  this text
  quit                  leave";

#[tokio::main]
async fn main() -> Result<()> {
    // Logs go to stderr so they don't interleave with the rendered views
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    // Load environment variables
    dotenv::dotenv().ok();
    let config = ClientConfig::from_env()?;

    info!("🚀 Loan Assistant Client");
    info!("📍 Backend: {}", config.backend_url);

    let transport = Arc::new(HttpTransport::new(&config)?);
    let prediction = PredictionFlow::new(transport.clone(), config.predict_endpoint.clone());
    let assistant = ChatFlow::new(transport, config.chat_endpoint.clone());

    println!("{}", HELP);

    // stdin failures surface as ClientError::Io
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        let line = line.trim();
        let (command, rest) = line
            .split_once(char::is_whitespace)
            .map(|(command, rest)| (command, rest.trim()))
            .unwrap_or((line, ""));

        match command {
            "" => {}
            "help" => println!("{}", HELP),
            "set" => {
                let Some((field, value)) = rest.split_once(char::is_whitespace) else {
                    println!("usage: set <field> <value>");
                    continue;
                };
                if let Err(e) = prediction.update_field_named(field, value.trim()).await {
                    println!("{}", e);
                }
            }
            "form" => print_lines(render::render_view(&prediction.snapshot().await)),
            "predict" => spawn_prediction(&prediction),
            "open" => assistant.open().await,
            "close" => assistant.close().await,
            "chat" => {
                if assistant.is_open().await {
                    spawn_chat(&assistant, rest.to_string());
                } else {
                    println!("The assistant is closed; type `open` first.");
                }
            }
            "history" => {
                for message in assistant.snapshot().await.log.messages() {
                    println!("{}", chat::render_message(message));
                }
            }
            "quit" | "exit" => break,
            other => println!("Unknown command `{}`; type `help`.", other),
        }
    }

    prediction.dispose();
    assistant.dispose();
    info!("👋 Bye");

    Ok(())
}

fn print_lines(lines: Vec<String>) {
    for line in lines {
        println!("{}", line);
    }
}

fn spawn_prediction(flow: &PredictionFlow) {
    let flow = flow.clone();
    tokio::spawn(async move {
        match flow.submit().await {
            SubmitOutcome::Completed | SubmitOutcome::Failed(_) => {
                let view = flow.snapshot().await;
                if let Some(result) = &view.result {
                    print_lines(render::render_result(result));
                }
                if let Some(failure) = &view.failure {
                    println!("⚠️ {}", failure.notice());
                }
            }
            SubmitOutcome::Incomplete(missing) => {
                let labels: Vec<&str> = missing.iter().map(|field| field.label()).collect();
                println!("Please fill in: {}", labels.join(", "));
            }
            SubmitOutcome::Busy => println!("Predicting... please wait for the current request."),
            SubmitOutcome::Detached => {}
        }
    });
}

fn spawn_chat(flow: &ChatFlow, text: String) {
    let flow = flow.clone();
    tokio::spawn(async move {
        match flow.send_message(text).await {
            SendOutcome::Replied | SendOutcome::Failed(_) => {
                if let Some(reply) = flow.snapshot().await.log.last() {
                    println!("{}", chat::render_message(reply));
                }
            }
            SendOutcome::Empty => println!("Type a message after `chat`."),
            SendOutcome::Busy => println!("The assistant is still answering."),
            SendOutcome::Detached => {}
        }
    });
}
