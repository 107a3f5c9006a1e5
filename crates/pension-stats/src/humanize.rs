/// Word-scaled rendering of large dollar figures ("1.2 million").
///
/// Values under one million are rendered as the plain integer.
pub fn intword(value: i64) -> String {
    const SCALES: [(i32, &str); 5] = [
        (6, "million"),
        (9, "billion"),
        (12, "trillion"),
        (15, "quadrillion"),
        (18, "quintillion"),
    ];

    if value < 1_000_000 {
        return value.to_string();
    }

    for (exponent, word) in SCALES {
        let large = 10_f64.powi(exponent);
        if (value as f64) < large * 1000.0 {
            return format!("{:.1} {word}", value as f64 / large);
        }
    }

    value.to_string()
}

/// `intword` for fractional amounts, truncating toward zero first.
pub fn intword_f64(value: f64) -> String {
    intword(value.trunc() as i64)
}
