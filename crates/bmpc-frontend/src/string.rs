use std::sync::Arc;

use bmpc_scheduler::{PartyId, Scheduler, Secrecy};
use tracing::trace;

use crate::{
    bit::Bit,
    int::{Int, IntShare},
    types::{BatchKind, Joined, Public, Secret, SecrecyJoin, SecrecyKind},
    wire::Input,
    FrontendError,
};

/// Shares of an [`AsciiString`], one [`IntShare`] per character.
pub type AsciiStringShare<B> = Vec<IntShare<B>>;

type Char<S, B> = Int<8, S, B>;

/// An ASCII string of at most `MAX_WIDTH` characters held by a scheduler.
///
/// Every string occupies `MAX_WIDTH` 8-bit characters; shorter strings are padded with NUL. For
/// public strings the length is known to every party.
#[derive(Debug)]
pub struct AsciiString<const MAX_WIDTH: usize, S, B> {
    chars: Vec<Char<S, B>>,
    /// Length of every batch element. Empty for secret strings.
    known_sizes: Vec<usize>,
}

impl<const MAX_WIDTH: usize, S, B> Clone for AsciiString<MAX_WIDTH, S, B> {
    fn clone(&self) -> Self {
        Self {
            chars: self.chars.clone(),
            known_sizes: self.known_sizes.clone(),
        }
    }
}

impl<const MAX_WIDTH: usize, S: SecrecyKind, B: BatchKind> AsciiString<MAX_WIDTH, S, B> {
    const IS_MAX_WIDTH_VALID: () = assert!(MAX_WIDTH > 0, "maximum width must be positive");

    fn input<T: AsRef<str>>(
        scheduler: &Arc<dyn Scheduler>,
        strings: &[T],
        input: Input,
    ) -> Result<Self, FrontendError> {
        for s in strings {
            let s = s.as_ref();
            if !s.is_ascii() {
                return Err(FrontendError::NotAscii);
            }
            if s.len() > MAX_WIDTH {
                return Err(FrontendError::StringTooLong {
                    max_width: MAX_WIDTH,
                    given: s.len(),
                });
            }
        }

        let chars = (0..MAX_WIDTH)
            .map(|i| {
                let column: Vec<i64> = strings
                    .iter()
                    .map(|s| i64::from(s.as_ref().as_bytes().get(i).copied().unwrap_or(0)))
                    .collect();
                Char::<S, B>::input(scheduler, &column, B::BATCHED, input)
            })
            .collect::<Result<Vec<_>, _>>()?;

        let _: () = Self::IS_MAX_WIDTH_VALID;

        // Public strings keep their input length, including any embedded NUL.
        let known_sizes = if S::SECRECY == Secrecy::Public {
            strings.iter().map(|s| s.as_ref().len()).collect()
        } else {
            Vec::new()
        };

        Ok(Self { chars, known_sizes })
    }

    /// Assembles a string, recomputing the known sizes if the result is public.
    fn from_chars(chars: Vec<Char<S, B>>) -> Result<Self, FrontendError> {
        let _: () = Self::IS_MAX_WIDTH_VALID;

        let known_sizes = if S::SECRECY == Secrecy::Public {
            let columns = chars
                .iter()
                .map(Char::<S, B>::values)
                .collect::<Result<Vec<_>, _>>()?;
            let len = columns.first().map_or(0, Vec::len);

            (0..len)
                .map(|j| {
                    columns
                        .iter()
                        .position(|column| column[j] == 0)
                        .unwrap_or(MAX_WIDTH)
                })
                .collect()
        } else {
            Vec::new()
        };

        Ok(Self { chars, known_sizes })
    }

    /// Returns the upper case version of the string.
    pub fn to_upper_case(&self) -> Result<Self, FrontendError> {
        Err(FrontendError::Unimplemented("to_upper_case"))
    }

    /// Returns the lower case version of the string.
    pub fn to_lower_case(&self) -> Result<Self, FrontendError> {
        Err(FrontendError::Unimplemented("to_lower_case"))
    }

    /// Appends `other` to the string.
    pub fn concat<const OTHER_WIDTH: usize, const OUT_WIDTH: usize, O>(
        &self,
        _other: &AsciiString<OTHER_WIDTH, O, B>,
    ) -> Result<AsciiString<OUT_WIDTH, Joined<S, O>, B>, FrontendError>
    where
        O: SecrecyKind,
        S: SecrecyJoin<O>,
    {
        Err(FrontendError::Unimplemented("concat"))
    }

    /// Returns `other` where `choice` is set and `self` elsewhere.
    pub fn mux<C, O>(
        &self,
        choice: &Bit<C, B>,
        other: &AsciiString<MAX_WIDTH, O, B>,
    ) -> Result<AsciiString<MAX_WIDTH, Joined<C, Joined<S, O>>, B>, FrontendError>
    where
        C: SecrecyKind + SecrecyJoin<Joined<S, O>>,
        O: SecrecyKind,
        S: SecrecyJoin<O>,
    {
        let chars = self
            .chars
            .iter()
            .zip(&other.chars)
            .map(|(a, b)| a.mux(choice, b))
            .collect::<Result<Vec<_>, _>>()?;

        AsciiString::from_chars(chars)
    }
}

impl<const MAX_WIDTH: usize, B: BatchKind> AsciiString<MAX_WIDTH, Public, B> {
    /// Creates a public string known to every party.
    pub fn new_public<T: AsRef<str>>(
        scheduler: &Arc<dyn Scheduler>,
        value: B::Value<T>,
    ) -> Result<Self, FrontendError> {
        Self::input(scheduler, &B::into_batch::<T>(value), Input::Public)
    }

    /// Returns the length of the string.
    pub fn known_size(&self) -> B::Value<usize> {
        B::from_batch(self.known_sizes.clone())
    }

    /// Returns the plaintext string with all NUL characters removed.
    pub fn get_value(&self) -> Result<B::Value<String>, FrontendError> {
        let columns = self
            .chars
            .iter()
            .map(Char::<Public, B>::values)
            .collect::<Result<Vec<_>, _>>()?;
        let len = columns.first().map_or(0, Vec::len);

        let strings: Vec<String> = (0..len)
            .map(|j| {
                columns
                    .iter()
                    .map(|column| column[j] as u8)
                    .filter(|c| *c != 0)
                    .map(char::from)
                    .collect()
            })
            .collect();

        Ok(B::from_batch(strings))
    }
}

impl<const MAX_WIDTH: usize, B: BatchKind> AsciiString<MAX_WIDTH, Secret, B> {
    /// Creates a secret string holding an input of `party`. Other parties pass a placeholder of
    /// the same batch size.
    pub fn new_secret<T: AsRef<str>>(
        scheduler: &Arc<dyn Scheduler>,
        value: B::Value<T>,
        party: PartyId,
    ) -> Result<Self, FrontendError> {
        Self::input(scheduler, &B::into_batch::<T>(value), Input::Private(party))
    }

    /// Recreates a secret string from shares returned by
    /// [`extract_ascii_string_share`](Self::extract_ascii_string_share).
    pub fn from_share(
        scheduler: &Arc<dyn Scheduler>,
        share: AsciiStringShare<B>,
    ) -> Result<Self, FrontendError> {
        if share.len() != MAX_WIDTH {
            return Err(FrontendError::InvalidShare {
                expected: MAX_WIDTH,
                actual: share.len(),
            });
        }

        let chars = share
            .into_iter()
            .map(|c| Char::<Secret, B>::from_share(scheduler, c))
            .collect::<Result<Vec<_>, _>>()?;

        Self::from_chars(chars)
    }

    /// Returns this party's shares of every character.
    pub fn extract_ascii_string_share(&self) -> Result<AsciiStringShare<B>, FrontendError> {
        self.chars.iter().map(Char::<Secret, B>::extract_int_share).collect()
    }

    /// Reveals the string to `party`. The known size becomes the position of the first NUL.
    pub fn open_to_party(
        &self,
        party: PartyId,
    ) -> Result<AsciiString<MAX_WIDTH, Public, B>, FrontendError> {
        let chars = self
            .chars
            .iter()
            .map(|c| c.open_to_party(party))
            .collect::<Result<Vec<_>, _>>()?;

        let opened = AsciiString::from_chars(chars)?;
        trace!(party, known_sizes = ?opened.known_sizes, "opened string");

        Ok(opened)
    }

    /// Returns the length of the string as a secret integer.
    pub fn private_size<const SIZE_WIDTH: usize>(
        &self,
    ) -> Result<Int<SIZE_WIDTH, Secret, B>, FrontendError> {
        Err(FrontendError::Unimplemented("private_size"))
    }
}
