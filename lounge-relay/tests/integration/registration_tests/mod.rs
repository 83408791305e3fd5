mod test_host_slot_released;
mod test_second_host_rejected;
