use crate::core::engine::Command;
use teloxide::utils::command::BotCommands;

#[derive(BotCommands, Clone, Debug, PartialEq)]
#[command(rename_rule = "lowercase", description = "Valentine Proposal Bot commands:")]
pub enum UserCommand {
    #[command(description = "welcome message")]
    Start,
    #[command(description = "show this help")]
    Help,
    #[command(description = "pay for a proposal link")]
    Pay,
    #[command(description = "create a new proposal link")]
    Create,
}

impl From<UserCommand> for Command {
    fn from(command: UserCommand) -> Self {
        match command {
            UserCommand::Start => Command::Start,
            UserCommand::Help => Command::Help,
            UserCommand::Pay => Command::Pay,
            UserCommand::Create => Command::Create,
        }
    }
}

#[derive(BotCommands, Clone, Debug, PartialEq)]
#[command(rename_rule = "lowercase")]
pub enum AdminCommand {
    /// Links this chat as the approver.
    Start,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_user_commands() {
        assert_eq!(
            UserCommand::parse("/pay", "valentine_bot").unwrap(),
            UserCommand::Pay
        );
        assert_eq!(
            UserCommand::parse("/create@valentine_bot", "valentine_bot").unwrap(),
            UserCommand::Create
        );
        assert!(UserCommand::parse("/delete", "valentine_bot").is_err());
        assert!(UserCommand::parse("pay", "valentine_bot").is_err());
    }

    #[test]
    fn test_parse_admin_commands() {
        assert_eq!(
            AdminCommand::parse("/start", "valentine_admin_bot").unwrap(),
            AdminCommand::Start
        );
        assert!(AdminCommand::parse("/pay", "valentine_admin_bot").is_err());
    }

    #[test]
    fn test_commands_map_to_engine_commands() {
        assert_eq!(Command::from(UserCommand::Start), Command::Start);
        assert_eq!(Command::from(UserCommand::Create), Command::Create);
    }
}
