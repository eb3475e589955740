//! Guard helpers shared by the Warden crates.
//!
//! Every `check_*` function takes the error to return on failure, so callers
//! keep their own error taxonomy: `check_nonzero(&id, StateError::InvalidIdentifier)?`.

macro_rules! guard {
  ($func_name:ident, $($param:ident: $type:ty),* $(,)? | $check:expr) => {
      #[inline(always)]
      pub fn $func_name<E>($($param: $type,)* error: E) -> Result<(), E> {
          if $check {
              Ok(())
          } else {
              Err(error)
          }
      }
  };
}

macro_rules! guard_return {
  ($func_name:ident, $return_type:ty, $($param:ident: $type:ty),* $(,)? | $check:expr) => {
      #[inline(always)]
      pub fn $func_name<E>($($param: $type,)* error: E) -> Result<$return_type, E> {
          match $check {
              Some(value) => Ok(value),
              None => Err(error),
          }
      }
  };
}

guard!(check_condition, condition: bool | condition);

guard!(check_nonzero, bytes: &[u8] |
  bytes.iter().any(|b| *b != 0)
);

guard!(check_fits_bits, value: u64, bits: u32 |
  bits >= 64 || value >> bits == 0
);

#[inline(always)]
pub fn check_split<E>(bytes: &[u8], mid: usize, error: E) -> Result<(&[u8], &[u8]), E> {
    if bytes.len() >= mid {
        Ok(bytes.split_at(mid))
    } else {
        Err(error)
    }
}

guard_return!(check_array_32, [u8; 32], bytes: &[u8] | {
  <[u8; 32]>::try_from(bytes).ok()
});
