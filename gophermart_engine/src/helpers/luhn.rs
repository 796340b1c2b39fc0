//! Luhn (mod 10) checksum for order numbers.
//!
//! Starting from the rightmost digit, every second digit is doubled, subtracting 9 when the result exceeds 9. The
//! number is valid when the sum of all the resulting digits is divisible by 10.

/// Returns true if the decimal digits of `number` pass the Luhn check. Non-positive numbers never pass.
pub fn is_valid(number: i64) -> bool {
    if number <= 0 {
        return false;
    }
    checksum(number) % 10 == 0
}

fn checksum(mut number: i64) -> i64 {
    let mut sum = 0;
    let mut double = false;
    while number > 0 {
        let mut digit = number % 10;
        if double {
            digit *= 2;
            if digit > 9 {
                digit -= 9;
            }
        }
        sum += digit;
        double = !double;
        number /= 10;
    }
    sum
}
