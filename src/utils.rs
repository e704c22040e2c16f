/// Gets the query ID (first two bytes of any DNS message).
pub fn get_query_id(packets: &[u8]) -> u16 {
    crate::wire::get_u16(packets, 0).unwrap_or(0)
}
