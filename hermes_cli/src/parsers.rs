pub fn parse_timestamp(input: &str) -> Result<jiff::Timestamp, String> {
    if let Ok(timestamp) = input.parse::<jiff::Timestamp>() {
        return Ok(timestamp);
    }

    if let Ok(zoned) = input.parse::<jiff::Zoned>() {
        return Ok(zoned.timestamp());
    }

    if let Ok(seconds) = input.parse::<i64>() {
        return jiff::Timestamp::from_second(seconds).map_err(|error| error.to_string());
    }

    Err(String::from("Invalid timestamp"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_timestamp() {
        let expected: jiff::Timestamp = "2024-01-15T08:00:00Z".parse().unwrap();

        assert_eq!(parse_timestamp("2024-01-15T08:00:00Z").unwrap(), expected);
        assert_eq!(
            parse_timestamp("2024-01-15T09:00:00+01:00[Europe/Berlin]").unwrap(),
            expected
        );
        assert_eq!(parse_timestamp("1705305600").unwrap(), expected);
        assert!(parse_timestamp("tomorrow").is_err());
    }
}
