use clap::Parser;
use futures_util::{SinkExt, StreamExt};
use shared::ClientCommand;
use tokio_tungstenite::connect_async;
use tokio_tungstenite::tungstenite::Message;

#[derive(Parser, Debug)]
#[command(author, version, about = "Scripted hide-and-seek player", long_about = None)]
struct Args {
    /// Server address to connect to
    #[arg(short = 's', long, default_value = "127.0.0.1:8080")]
    server: String,

    /// Player name
    #[arg(short = 'n', long, default_value = "tester")]
    name: String,

    /// Join this game instead of opening a new one
    #[arg(short = 'c', long)]
    code: Option<String>,

    /// Stop after this many frames
    #[arg(short = 'f', long, default_value = "50")]
    frames: usize,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    let url = format!("ws://{}/socket", args.server);
    println!("Connecting to {}", url);
    let (ws, _) = connect_async(url.as_str()).await?;
    let (mut write, mut read) = ws.split();

    let opening = match &args.code {
        Some(code) => ClientCommand::Join {
            code: code.clone(),
            name: args.name.clone(),
        },
        None => ClientCommand::NewGame {
            name: args.name.clone(),
        },
    };
    let creator = args.code.is_none();
    println!("Sending {:?}", opening.tag());
    write.send(Message::text(opening.to_string())).await?;

    let mut received = 0;
    while let Some(frame) = read.next().await {
        let text = match frame? {
            Message::Text(text) => text.as_str().to_string(),
            Message::Close(_) => break,
            _ => continue,
        };
        received += 1;
        println!("--- frame {} ---\n{}", received, text);

        let tag = text.split('\n').next().unwrap_or_default();
        let reply = match tag {
            "joined" if creator => Some(ClientCommand::Start),
            "setup" => Some(ClientCommand::ReadyToGo),
            "winner" | "round over" => Some(ClientCommand::ReadyForNextSetup),
            "no such game" | "name is taken" | "game is full" | "too many games in session" => {
                println!("Refused by server");
                break;
            }
            _ => None,
        };

        if let Some(command) = reply {
            println!("Sending {:?}", command.tag());
            write.send(Message::text(command.to_string())).await?;
        }

        if received >= args.frames {
            break;
        }
    }

    write.close().await?;
    println!("Test client finished");
    Ok(())
}
