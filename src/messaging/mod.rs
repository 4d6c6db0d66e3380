// Messaging - Lock-free channels between the control loop and the render thread

pub mod channels;
pub mod command;
pub mod notification;
