use anyhow::{anyhow, bail, Result};
use regex::Regex;
use std::sync::OnceLock;

/// printf-style rendering of a frame index, e.g. `%04i` -> `0007`.
///
/// Exactly one integer conversion `%[flags][width](d|i|u)` is accepted, with
/// flags from `-+ 0`. `%%` renders a literal percent sign.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct IndexFormat {
    prefix: String,
    suffix: String,
    spec: Conversion,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
struct Conversion {
    left_align: bool,
    zero_pad: bool,
    plus_sign: bool,
    space_sign: bool,
    width: usize,
}

impl IndexFormat {
    pub fn parse(pattern: &str) -> Result<Self> {
        static CONVERSION_RE: OnceLock<Regex> = OnceLock::new();
        let re = CONVERSION_RE
            .get_or_init(|| Regex::new(r"%(?:%|([-+ 0]*)([0-9]*)[diu])").unwrap());

        let mut prefix = String::new();
        let mut suffix = String::new();
        let mut spec: Option<Conversion> = None;
        let mut last = 0;

        for caps in re.captures_iter(pattern) {
            let Some(whole) = caps.get(0) else {
                continue;
            };
            let literal = &pattern[last..whole.start()];
            if literal.contains('%') {
                bail!("unsupported conversion in index format {:?}", pattern);
            }
            let target = if spec.is_some() { &mut suffix } else { &mut prefix };
            target.push_str(literal);
            last = whole.end();

            if whole.as_str() == "%%" {
                target.push('%');
                continue;
            }
            if spec.is_some() {
                bail!("index format {:?} has more than one conversion", pattern);
            }
            let flags = caps.get(1).map_or("", |m| m.as_str());
            let width = match caps.get(2).map_or("", |m| m.as_str()) {
                "" => 0,
                digits => digits
                    .parse()
                    .map_err(|_| anyhow!("index format width {:?} is too large", digits))?,
            };
            spec = Some(Conversion {
                left_align: flags.contains('-'),
                zero_pad: flags.contains('0'),
                plus_sign: flags.contains('+'),
                space_sign: flags.contains(' '),
                width,
            });
        }

        let tail = &pattern[last..];
        if tail.contains('%') {
            bail!("unsupported conversion in index format {:?}", pattern);
        }
        let spec = spec.ok_or_else(|| {
            anyhow!(
                "index format {:?} needs one integer conversion such as %04i",
                pattern
            )
        })?;
        suffix.push_str(tail);

        Ok(Self {
            prefix,
            suffix,
            spec,
        })
    }

    pub fn render(&self, index: i64) -> String {
        let spec = &self.spec;
        let sign = if index < 0 {
            "-"
        } else if spec.plus_sign {
            "+"
        } else if spec.space_sign {
            " "
        } else {
            ""
        };
        let digits = index.unsigned_abs().to_string();
        let len = sign.len() + digits.len();
        let pad = spec.width.saturating_sub(len);

        let mut number = String::with_capacity(len + pad);
        if spec.left_align {
            number.push_str(sign);
            number.push_str(&digits);
            number.extend(std::iter::repeat(' ').take(pad));
        } else if spec.zero_pad {
            number.push_str(sign);
            number.extend(std::iter::repeat('0').take(pad));
            number.push_str(&digits);
        } else {
            number.extend(std::iter::repeat(' ').take(pad));
            number.push_str(sign);
            number.push_str(&digits);
        }

        format!("{}{}{}", self.prefix, number, self.suffix)
    }
}
