//! Server-side reservation script.
//!
//! `KEYS[1]` is the available counter, `KEYS[2]` the reserved counter,
//! `ARGV[1]` the required amount. Replies `{code, current_amount}` where
//! `code` is 1 (key missing, amount nil), 2 (reserved, amount after the
//! decrement) or 3 (insufficient, amount unchanged, sent as the stored
//! string so no precision is lost).
//!
//! Redis does not undo the writes of a script that fails part-way, so every
//! check runs before the first write. Both stored values must be integers
//! INCRBY/DECRBY accept: canonical decimal, within the signed 64-bit range.
//! Anything else (`3.5`, `1e3`, `07`) is an error reply with nothing written.
//! The comparison is done on the digit strings because Lua numbers are
//! doubles. Reserved is incremented before available is decremented: once
//! both values are valid INCRBY is the only step that can fail (overflow),
//! and it fails before anything is written.

pub(crate) const RESERVE_STOCK: &str = r#"
local function is_integer(raw)
  if raw == '0' then
    return true
  end
  local digits = string.match(raw, '^-?([1-9]%d*)$')
  if digits == nil or #digits > 19 then
    return false
  end
  if #digits < 19 then
    return true
  end
  if string.sub(raw, 1, 1) == '-' then
    return digits <= '9223372036854775808'
  end
  return digits <= '9223372036854775807'
end

-- a < b for valid integers a and b, b positive
local function below(a, b)
  if a == '0' or string.sub(a, 1, 1) == '-' then
    return true
  end
  if #a ~= #b then
    return #a < #b
  end
  return a < b
end

if redis.call('EXISTS', KEYS[1]) == 0 or redis.call('EXISTS', KEYS[2]) == 0 then
  return {1, false}
end

local required = ARGV[1]
local available = redis.call('GET', KEYS[1])
local reserved = redis.call('GET', KEYS[2])
if not is_integer(available) or not is_integer(reserved) then
  return redis.error_reply('ERR stock counter is not an integer')
end

if below(available, required) then
  return {3, available}
end

redis.call('INCRBY', KEYS[2], required)
local remaining = redis.call('DECRBY', KEYS[1], required)
return {2, remaining}
"#;
