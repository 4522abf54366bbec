use super::account::AccountId;
use rust_decimal::Decimal;
use serde::Deserialize;

#[derive(Debug, Deserialize, PartialEq, Clone, Copy)]
#[serde(rename_all = "lowercase")]
pub enum CommandType {
    Open,
    Convert,
    Withdraw,
}

/// One row of a command script.
///
/// `amount` is optional for `open` (the configured initial balance is used)
/// and required otherwise; `address` is only read by `withdraw`.
#[derive(Debug, Deserialize, PartialEq, Clone)]
pub struct Command {
    pub r#type: CommandType,
    pub account: AccountId,
    pub amount: Option<Decimal>,
    pub address: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn parse(csv: &str) -> Command {
        let mut reader = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .flexible(true)
            .from_reader(csv.as_bytes());
        reader
            .deserialize()
            .next()
            .unwrap()
            .expect("Failed to deserialize command")
    }

    #[test]
    fn test_withdraw_deserialization() {
        let command = parse("type, account, amount, address\nwithdraw, 3, 5.00, 0xabc");
        assert_eq!(command.r#type, CommandType::Withdraw);
        assert_eq!(command.account, AccountId(3));
        assert_eq!(command.amount, Some(dec!(5.00)));
        assert_eq!(command.address.as_deref(), Some("0xabc"));
    }

    #[test]
    fn test_open_without_amount() {
        let command = parse("type, account, amount, address\nopen, 1, ,");
        assert_eq!(command.r#type, CommandType::Open);
        assert_eq!(command.amount, None);
        assert_eq!(command.address, None);
    }

    #[test]
    fn test_short_row_is_accepted() {
        let command = parse("type, account, amount, address\nconvert, 1, 500");
        assert_eq!(command.r#type, CommandType::Convert);
        assert_eq!(command.amount, Some(dec!(500)));
        assert_eq!(command.address, None);
    }
}
