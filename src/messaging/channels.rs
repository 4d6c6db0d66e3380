// Communication channels lock-free

use crate::messaging::command::GraphCommand;
use crate::messaging::notification::GraphNotification;
use ringbuf::{HeapRb, traits::Split};

pub type CommandProducer = ringbuf::HeapProd<GraphCommand>;
pub type CommandConsumer = ringbuf::HeapCons<GraphCommand>;

pub fn create_command_channel(capacity: usize) -> (CommandProducer, CommandConsumer) {
    let rb = HeapRb::<GraphCommand>::new(capacity);
    rb.split()
}

pub type NotificationProducer = ringbuf::HeapProd<GraphNotification>;
pub type NotificationConsumer = ringbuf::HeapCons<GraphNotification>;

pub fn create_notification_channel(
    capacity: usize,
) -> (NotificationProducer, NotificationConsumer) {
    let rb = HeapRb::<GraphNotification>::new(capacity);
    rb.split()
}
