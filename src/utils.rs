use crate::errors::*;

/// Format `value` the way C's `%.17g` does, which round-trips any `f64`.
pub fn _format_g17(value: f64) -> String {
    if value.is_nan() {
        return "nan".to_string();
    }
    if value.is_infinite() {
        return if value > 0.0 { "inf" } else { "-inf" }.to_string();
    }
    if value == 0.0 {
        return if value.is_sign_negative() { "-0" } else { "0" }.to_string();
    }

    let sci = format!("{:.16e}", value);
    let (mantissa, exponent) = match sci.split_once('e') {
        Some((mantissa, exponent)) => match exponent.parse::<i32>() {
            Ok(exponent) => (mantissa, exponent),
            Err(_) => return sci,
        },
        None => return sci,
    };

    if (-4..17).contains(&exponent) {
        let decimals = (16 - exponent) as usize;
        _trim_fraction(format!("{:.*}", decimals, value))
    } else {
        format!(
            "{}e{}{:02}",
            _trim_fraction(mantissa.to_string()),
            if exponent < 0 { '-' } else { '+' },
            exponent.abs()
        )
    }
}

fn _trim_fraction(mut s: String) -> String {
    if s.contains('.') {
        let trimmed_len = s.trim_end_matches('0').trim_end_matches('.').len();
        s.truncate(trimmed_len);
    }
    s
}

/// Parse exactly `N` comma separated floating point values.
///
/// Whitespace around values is allowed, empty values are not.
pub fn _parse_f64_list<const N: usize>(s: &str) -> Result<[f64; N]> {
    let tokens: Vec<&str> = s.split(',').map(str::trim).collect();
    if tokens.iter().any(|token| token.is_empty()) {
        return Err(GdalError::BadArgument(format!(
            "Empty value in comma separated list \"{s}\""
        )));
    }
    if tokens.len() != N {
        return Err(GdalError::BadArgument(format!(
            "Expected {} comma separated values, got {}",
            N,
            tokens.len()
        )));
    }
    let mut values = [0.0; N];
    for (value, token) in values.iter_mut().zip(tokens) {
        *value = token.parse()?;
    }
    Ok(values)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_g17_integers() {
        assert_eq!(_format_g17(10.0), "10");
        assert_eq!(_format_g17(-1.0), "-1");
        assert_eq!(_format_g17(0.0), "0");
        assert_eq!(_format_g17(123456.0), "123456");
    }

    #[test]
    fn test_format_g17_fractions() {
        assert_eq!(_format_g17(0.5), "0.5");
        assert_eq!(_format_g17(0.1), "0.10000000000000001");
        assert_eq!(_format_g17(0.0001), "0.0001");
    }

    #[test]
    fn test_format_g17_exponent() {
        assert_eq!(_format_g17(1e20), "1e+20");
        assert_eq!(_format_g17(2f64.powi(-30)), "9.3132257461547852e-10");
    }

    #[test]
    fn test_format_g17_round_trips() {
        for value in [std::f64::consts::PI, -2.5e-300, 6.02214076e23, 1.0 / 3.0] {
            let parsed: f64 = _format_g17(value).parse().unwrap();
            assert_eq!(parsed, value);
        }
    }

    #[test]
    fn test_parse_f64_list() {
        let values: [f64; 3] = _parse_f64_list("1, 2.5,-3").unwrap();
        assert_eq!(values, [1.0, 2.5, -3.0]);
        assert!(_parse_f64_list::<3>("1,2").is_err());
        assert!(_parse_f64_list::<2>("1,x").is_err());
    }

    #[test]
    fn test_parse_f64_list_empty_values() {
        for s in ["1,,2", "1,2,3,", ",1,2", "1, ,2", ""] {
            assert!(
                matches!(_parse_f64_list::<3>(s), Err(GdalError::BadArgument(_))),
                "{s:?} should be rejected"
            );
        }
    }
}
