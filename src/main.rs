use anyhow::{Context, Result};
use std::sync::Arc;
use teloxide::{dptree, prelude::*, types::ChatAction, utils::command::BotCommands};
use tonratebot::{reply, settings::Settings, strategy::PriceResolver};

#[derive(BotCommands, Clone)]
#[command(rename_rule = "lowercase", description = "TON rate bot commands:")]
enum Command {
    #[command(description = "greeting and command list.")]
    Start,
    #[command(description = "display this text.")]
    Help,
    #[command(description = "current TON price in RUB.")]
    Price,
    #[command(description = "convert an amount of TON to RUB.")]
    Convert(String),
}

async fn answer(
    bot: Bot,
    msg: Message,
    command: Command,
    resolver: Arc<PriceResolver>,
) -> ResponseResult<()> {
    match command {
        Command::Start => {
            let user = msg
                .from()
                .map(|user| user.first_name.clone())
                .unwrap_or_else(|| "there".to_owned());
            bot.send_message(msg.chat.id, reply::greeting(&user))
                .await?
        }

        Command::Help => {
            bot.send_message(msg.chat.id, Command::descriptions().to_string())
                .await?
        }

        Command::Price => {
            bot.send_chat_action(msg.chat.id, ChatAction::Typing).await?;
            let rate = resolver.resolve_cross_rate().await;
            bot.send_message(msg.chat.id, reply::price_message(rate.as_ref()))
                .await?
        }

        Command::Convert(ref arg) => match reply::parse_amount(arg) {
            Ok(amount) => {
                bot.send_chat_action(msg.chat.id, ChatAction::Typing).await?;
                let rate = resolver.resolve_cross_rate().await;
                bot.send_message(msg.chat.id, reply::convert_message(amount, rate.as_ref()))
                    .await?
            }
            Err(usage) => bot.send_message(msg.chat.id, usage).await?,
        },
    };

    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenv::dotenv().ok();
    env_logger::init();
    log::info!("Starting TON rate bot...");

    let settings = Settings::load().context("Loading settings")?;
    let resolver = PriceResolver::from_settings(&settings)
        .context("Building price sources")?;
    log::info!("Fiat price chain: {}", resolver.chain_description());

    let bot = Bot::from_env();
    let container = Arc::new(resolver);
    let handler = Update::filter_message()
        .filter_command::<Command>()
        .endpoint(answer);
    Dispatcher::builder(bot, handler)
        .dependencies(dptree::deps![container])
        .enable_ctrlc_handler()
        .build()
        .dispatch()
        .await;
    Ok(())
}
